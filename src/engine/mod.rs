//! The embeddable facade: `start`/`stop` a database and run SQL text
//! against it through [`execute_sql`](Engine::execute_sql).
//!
//! - [`config`] - flat properties-style configuration
//! - [`audit`] - background audit-log writer
//! - [`stats`] - bounded ring buffer of recent query timings
//! - [`prepared`] - positional-parameter SQL substitution
//! - [`csv`] - CSV import/export
//! - [`backup`] - logical backup/restore as replayable SQL

pub mod audit;
pub mod backup;
pub mod config;
pub mod csv;
pub mod prepared;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};
use parking_lot::{Mutex, RwLock};

use crate::buffer::BufferPool;
use crate::common::{Error, Result};
use crate::concurrency::{LockManager, TransactionManager};
use crate::db::Database;
use crate::sql::{QueryCache, QueryExecutor, QueryResult, SqlParser, Statement};
use crate::storage::DiskManager;

pub use config::EngineConfig;
pub use prepared::{ParamValue, PreparedStatement};

use audit::{AuditEntry, AuditLogger};
use stats::QueryStats;

struct Running {
    database: Arc<RwLock<Database>>,
    executor: QueryExecutor,
    parser: SqlParser,
    cache: QueryCache,
    stats: QueryStats,
    audit: AuditLogger,
    #[allow(dead_code)]
    buffer_pool: BufferPool,
}

/// Owns the components of one running database: storage, indexes,
/// locking, SQL parsing/execution, caching, and audit logging.
///
/// Starts empty (`stop`ped); [`Engine::start`] and [`Engine::stop`] are
/// both idempotent.
pub struct Engine {
    running: Mutex<Option<Running>>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            running: Mutex::new(None),
        }
    }

    /// Bring up a database at `<data_dir>/<db_name>.ndb`, sized from
    /// `config`. Calling `start` on an already-running engine is a
    /// no-op.
    pub fn start(&self, db_name: &str, data_dir: impl AsRef<Path>, config: &EngineConfig) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Ok(());
        }

        let data_dir: PathBuf = data_dir.as_ref().to_path_buf();
        let disk_manager = DiskManager::open_or_create(&data_dir, db_name)?;
        let buffer_pool = BufferPool::new(disk_manager, config.buffer_pool_size);

        let database = Arc::new(RwLock::new(Database::new()));
        let lock_manager = Arc::new(LockManager::new());
        let transaction_manager = Arc::new(TransactionManager::new(lock_manager.clone()));
        let executor = QueryExecutor::new(database.clone(), lock_manager, transaction_manager);
        let audit = AuditLogger::start(&data_dir)?;

        info!("engine started: db={db_name} dir={}", data_dir.display());

        *running = Some(Running {
            database,
            executor,
            parser: SqlParser::new(),
            cache: QueryCache::new(),
            stats: QueryStats::new(),
            audit,
            buffer_pool,
        });
        Ok(())
    }

    /// Flush the buffer pool and close the audit logger. Calling
    /// `stop` on an already-stopped engine is a no-op.
    pub fn stop(&self) -> Result<()> {
        let mut running = self.running.lock();
        if let Some(mut r) = running.take() {
            r.buffer_pool.flush_all()?;
            r.audit.shutdown();
            info!("engine stopped");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Parse and execute one SQL statement: cache consult, parse,
    /// execute, then cache/invalidate/audit/record the outcome.
    pub fn execute_sql(&self, text: &str) -> Result<QueryResult> {
        let running = self.running.lock();
        let Some(r) = running.as_ref() else {
            return Err(Error::State("engine is not running".to_string()));
        };

        if let Some(cached) = r.cache.get(text) {
            return Ok(cached);
        }

        let statement = r.parser.parse(text).map_err(|e| e.into_sql_error())?;
        let start = Instant::now();
        let outcome = r.executor.execute(&statement);
        let elapsed = start.elapsed();

        match &outcome {
            Ok(result) => {
                if statement.is_select() {
                    r.cache.put(text, result.clone());
                } else {
                    for table in statement.referenced_tables() {
                        r.cache.invalidate_table(table);
                    }
                }
                if !statement.is_select() {
                    self.audit_write(r, &statement, text, true, "");
                }
                r.stats.record(text, elapsed, true);
            }
            Err(e) => {
                if !statement.is_select() {
                    self.audit_write(r, &statement, text, false, &e.to_string());
                }
                r.stats.record(text, elapsed, false);
            }
        }

        outcome.map_err(|e| e.into_sql_error())
    }

    fn audit_write(&self, running: &Running, statement: &Statement, sql: &str, success: bool, error: &str) {
        let operation = statement_operation_name(statement);
        let table = statement
            .referenced_tables()
            .first()
            .copied()
            .unwrap_or("")
            .to_string();
        running.audit.log(AuditEntry {
            operation,
            table,
            user: "system".to_string(),
            sql: sql.to_string(),
            success,
            error: error.to_string(),
        });
    }

    /// Parse `sql` (containing `?` placeholders) into a reusable
    /// [`PreparedStatement`], without binding parameters yet.
    pub fn prepare_statement(&self, sql: &str) -> PreparedStatement {
        PreparedStatement::new(sql)
    }

    /// Substitute `ps`'s bound parameters into its SQL text and run it
    /// through [`Engine::execute_sql`].
    pub fn execute_prepared(&self, ps: &PreparedStatement) -> Result<QueryResult> {
        let text = ps.render()?;
        self.execute_sql(&text)
    }

    pub(crate) fn with_database<T>(&self, f: impl FnOnce(&Database) -> T) -> Result<T> {
        let running = self.running.lock();
        let Some(r) = running.as_ref() else {
            return Err(Error::State("engine is not running".to_string()));
        };
        Ok(f(&r.database.read()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("error stopping engine on drop: {e}");
        }
    }
}

fn statement_operation_name(statement: &Statement) -> String {
    match statement {
        Statement::Select { .. } => "SELECT",
        Statement::Join { .. } => "JOIN",
        Statement::Insert { .. } => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete { .. } => "DELETE",
        Statement::CreateTable { .. } => "CREATE_TABLE",
        Statement::CreateIndex { .. } => "CREATE_INDEX",
        Statement::Show { .. } => "SHOW",
        Statement::Explain { .. } => "EXPLAIN",
        Statement::Vacuum { .. } => "VACUUM",
        Statement::Analyze { .. } => "ANALYZE",
    }
    .to_string()
}

/// Install `env_logger` at the level named by `config.log_level`. Not
/// required by any core operation; a convenience for a CLI caller that
/// wants one obvious place to wire up diagnostics.
pub fn init_logging(config: &EngineConfig) {
    let level = config.log_level.to_ascii_uppercase();
    let _ = env_logger::Builder::new()
        .parse_filters(&level)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_running_rejects_execute() {
        let engine = Engine::new();
        let err = engine.execute_sql("SELECT 1").unwrap_err();
        assert!(format!("{err}").contains("not running"));
    }

    #[test]
    fn test_start_stop_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new();
        let config = EngineConfig::default();
        engine.start("test", dir.path(), &config).unwrap();
        engine.start("test", dir.path(), &config).unwrap();
        assert!(engine.is_running());
        engine.stop().unwrap();
        engine.stop().unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_end_to_end_s1() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new();
        engine.start("test", dir.path(), &EngineConfig::default()).unwrap();

        engine
            .execute_sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50))")
            .unwrap();
        engine
            .execute_sql("INSERT INTO users (id, name) VALUES (1, 'Alice')")
            .unwrap();
        engine
            .execute_sql("INSERT INTO users (id, name) VALUES (2, 'Bob')")
            .unwrap();

        let result = engine.execute_sql("SELECT * FROM users WHERE id = 2").unwrap();
        match result {
            QueryResult::Select { records } => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].get("name"), Some("Bob"));
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_invalidated_after_update() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new();
        engine.start("test", dir.path(), &EngineConfig::default()).unwrap();

        engine
            .execute_sql("CREATE TABLE p (id INT PRIMARY KEY, price VARCHAR(10))")
            .unwrap();
        engine
            .execute_sql("INSERT INTO p (id, price) VALUES (1, '999.99')")
            .unwrap();

        let first = engine.execute_sql("SELECT price FROM p WHERE id = 1").unwrap();
        assert!(matches!(first, QueryResult::Select { .. }));

        engine
            .execute_sql("UPDATE p SET price = '1099.99' WHERE id = 1")
            .unwrap();

        let second = engine.execute_sql("SELECT price FROM p WHERE id = 1").unwrap();
        match second {
            QueryResult::Select { records } => {
                assert_eq!(records[0].get("price"), Some("1099.99"));
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }
}
