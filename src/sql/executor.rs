//! Dispatches on statement variant, arranging locks around each Table
//! operation and applying the read-path's ORDER BY / LIMIT / OFFSET.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::common::{Error, Result};
use crate::concurrency::{LockManager, TransactionManager};
use crate::db::Database;
use crate::sql::statement::{JoinType, OrderKey, ShowKind, Statement};
use crate::table::{Record, Table};

/// The result of executing one statement.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Select { records: Vec<Record> },
    Insert { affected: usize },
    Update { affected: usize },
    Delete { affected: usize },
    CreateTable { message: String },
    DropTable { message: String },
}

impl QueryResult {
    pub fn is_select(&self) -> bool {
        matches!(self, QueryResult::Select { .. })
    }
}

fn resource_for_table(table: &str) -> String {
    format!("table:{table}")
}

/// Dispatches parsed [`Statement`]s against a [`Database`], acquiring
/// the lock named by the matrix in §4.6 for the statement's duration.
pub struct QueryExecutor {
    database: Arc<parking_lot::RwLock<Database>>,
    lock_manager: Arc<LockManager>,
    transaction_manager: Arc<TransactionManager>,
}

impl QueryExecutor {
    pub fn new(
        database: Arc<parking_lot::RwLock<Database>>,
        lock_manager: Arc<LockManager>,
        transaction_manager: Arc<TransactionManager>,
    ) -> Self {
        QueryExecutor {
            database,
            lock_manager,
            transaction_manager,
        }
    }

    /// Execute `statement` inside its own transaction: begin, acquire
    /// the needed lock(s), run, release, commit. An error during
    /// execution aborts the transaction and is re-raised.
    pub fn execute(&self, statement: &Statement) -> Result<QueryResult> {
        let txn = self.transaction_manager.begin();

        let result = self.run(statement, txn.id());

        match &result {
            Ok(_) => {
                self.transaction_manager.commit(txn.id())?;
            }
            Err(_) => {
                self.transaction_manager.abort(txn.id());
            }
        }

        result
    }

    fn run(&self, statement: &Statement, txn_id: i64) -> Result<QueryResult> {
        match statement {
            Statement::Select {
                table,
                columns,
                where_clause,
                order_by,
                limit,
                offset,
            } => {
                self.lock_manager
                    .acquire_shared(txn_id, &resource_for_table(table));
                let db = self.database.read();
                let table_ref = db.get(table)?;
                let t = table_ref.read();
                let mut records = t.select_records(columns, where_clause.as_ref());
                drop(t);
                drop(db);
                apply_order_by(&mut records, order_by);
                apply_offset_limit(&mut records, *offset, *limit);
                self.lock_manager.release(txn_id, &resource_for_table(table));
                Ok(QueryResult::Select { records })
            }

            Statement::Join {
                columns,
                left_table,
                right_table,
                left_column,
                right_column,
                join_type,
                where_clause,
            } => {
                self.lock_manager
                    .acquire_shared(txn_id, &resource_for_table(left_table));
                self.lock_manager
                    .acquire_shared(txn_id, &resource_for_table(right_table));

                let db = self.database.read();
                let left = db.get(left_table)?;
                let right = db.get(right_table)?;
                let left_guard = left.read();
                let right_guard = right.read();
                let mut records = join_records(
                    &left_guard,
                    &right_guard,
                    left_column,
                    right_column,
                    *join_type,
                );
                drop(left_guard);
                drop(right_guard);
                drop(db);

                if let Some(pred) = where_clause {
                    records.retain(|r| pred.eval(r));
                }
                let projected: Vec<Record> = records.iter().map(|r| r.project(columns)).collect();

                self.lock_manager.release(txn_id, &resource_for_table(left_table));
                self.lock_manager.release(txn_id, &resource_for_table(right_table));
                Ok(QueryResult::Select { records: projected })
            }

            Statement::Insert { table, values } => {
                self.lock_manager
                    .acquire_exclusive(txn_id, &resource_for_table(table));
                let db = self.database.read();
                let table_ref = db.get(table)?;
                let mut t = table_ref.write();
                let outcome = t.insert_record(values.clone());
                drop(t);
                drop(db);
                self.lock_manager.release(txn_id, &resource_for_table(table));
                outcome?;
                Ok(QueryResult::Insert { affected: 1 })
            }

            Statement::Update {
                table,
                updates,
                where_clause,
            } => {
                self.lock_manager
                    .acquire_exclusive(txn_id, &resource_for_table(table));
                let db = self.database.read();
                let table_ref = db.get(table)?;
                let mut t = table_ref.write();
                let outcome = t.update_records(updates, where_clause.as_ref());
                drop(t);
                drop(db);
                self.lock_manager.release(txn_id, &resource_for_table(table));
                Ok(QueryResult::Update { affected: outcome? })
            }

            Statement::Delete { table, where_clause } => {
                self.lock_manager
                    .acquire_exclusive(txn_id, &resource_for_table(table));
                let db = self.database.read();
                let table_ref = db.get(table)?;
                let mut t = table_ref.write();
                let affected = t.delete_records(where_clause.as_ref());
                drop(t);
                drop(db);
                self.lock_manager.release(txn_id, &resource_for_table(table));
                Ok(QueryResult::Delete { affected })
            }

            Statement::CreateTable { table, columns } => {
                self.lock_manager
                    .acquire_exclusive(txn_id, "schema:default");
                let new_table = Table::new(table.clone(), columns.clone());
                let mut db = self.database.write();
                let outcome = db.create_table(new_table);
                drop(db);
                self.lock_manager.release(txn_id, "schema:default");
                outcome?;
                Ok(QueryResult::CreateTable {
                    message: format!("table '{table}' created"),
                })
            }

            Statement::CreateIndex {
                index_name,
                table,
                column,
            } => {
                self.lock_manager
                    .acquire_exclusive(txn_id, &resource_for_table(table));
                let db = self.database.read();
                let table_ref = db.get(table)?;
                let mut t = table_ref.write();
                let outcome = t.create_index(column);
                drop(t);
                drop(db);
                self.lock_manager.release(txn_id, &resource_for_table(table));
                outcome?;
                Ok(QueryResult::CreateTable {
                    message: format!("index '{index_name}' created on {table}({column})"),
                })
            }

            Statement::Show { kind, table } => self.execute_show(*kind, table.as_deref(), txn_id),

            Statement::Explain { inner } => self.execute_explain(inner, txn_id),

            Statement::Vacuum { table } => self.execute_on_tables(table.as_deref(), txn_id, |t| t.vacuum()),

            Statement::Analyze { table } => {
                self.execute_on_tables(table.as_deref(), txn_id, |t| t.analyze())
            }
        }
    }

    fn execute_on_tables(
        &self,
        table: Option<&str>,
        txn_id: i64,
        op: impl Fn(&Table) -> String,
    ) -> Result<QueryResult> {
        let db = self.database.read();
        let names: Vec<String> = match table {
            Some(t) => vec![t.to_string()],
            None => db.table_names(),
        };

        let mut messages = Vec::new();
        for name in &names {
            self.lock_manager
                .acquire_exclusive(txn_id, &resource_for_table(name));
            let t = db.get(name)?;
            let guard = t.read();
            messages.push(op(&guard));
            drop(guard);
            self.lock_manager.release(txn_id, &resource_for_table(name));
        }

        Ok(QueryResult::CreateTable {
            message: messages.join("; "),
        })
    }

    fn execute_show(&self, kind: ShowKind, table: Option<&str>, txn_id: i64) -> Result<QueryResult> {
        let db = self.database.read();
        let records = match kind {
            ShowKind::Tables | ShowKind::Databases => db
                .table_names()
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    let mut values = IndexMap::new();
                    values.insert("name".to_string(), name);
                    Record::new(i as i32 + 1, values)
                })
                .collect(),
            ShowKind::Indexes => {
                let names: Vec<String> = match table {
                    Some(t) => vec![t.to_string()],
                    None => db.table_names(),
                };
                let mut records = Vec::new();
                let mut id = 1;
                for name in names {
                    self.lock_manager.acquire_shared(txn_id, &resource_for_table(&name));
                    let t = db.get(&name)?;
                    let guard = t.read();
                    for col in guard.indexed_columns() {
                        let mut values = IndexMap::new();
                        values.insert("table".to_string(), name.clone());
                        values.insert("column".to_string(), col.to_string());
                        records.push(Record::new(id, values));
                        id += 1;
                    }
                    drop(guard);
                    self.lock_manager.release(txn_id, &resource_for_table(&name));
                }
                records
            }
            ShowKind::Stats => {
                let mut values = IndexMap::new();
                values.insert("tables".to_string(), db.table_names().len().to_string());
                vec![Record::new(1, values)]
            }
        };
        Ok(QueryResult::Select { records })
    }

    fn execute_explain(&self, inner: &Statement, txn_id: i64) -> Result<QueryResult> {
        let db = self.database.read();
        let tables = inner.referenced_tables();
        let table_name = tables.first().copied().unwrap_or("");

        let (uses_index, filter_desc) = if let Statement::Select { where_clause, .. } = inner {
            let uses_index = if let Ok(table_ref) = db.get(table_name) {
                let guard = table_ref.read();
                guard.predicate_uses_index(where_clause.as_ref())
            } else {
                false
            };
            (uses_index, format!("{where_clause:?}"))
        } else {
            (false, "none".to_string())
        };
        drop(db);
        let _ = txn_id;

        let ordering = match inner {
            Statement::Select { order_by, .. } if !order_by.is_empty() => order_by
                .iter()
                .map(|k| format!("{} {}", k.column, if k.ascending { "ASC" } else { "DESC" }))
                .collect::<Vec<_>>()
                .join(", "),
            _ => "none".to_string(),
        };

        let mut values = IndexMap::new();
        values.insert("operation".to_string(), format!("{inner:?}").split_whitespace().next().unwrap_or("").to_string());
        values.insert("table".to_string(), table_name.to_string());
        values.insert("filter".to_string(), filter_desc);
        values.insert("uses_index".to_string(), uses_index.to_string());
        values.insert("ordering".to_string(), ordering);
        values.insert("estimated_cost".to_string(), "1".to_string());

        Ok(QueryResult::Select {
            records: vec![Record::new(1, values)],
        })
    }
}

fn join_records(
    left: &Table,
    right: &Table,
    left_column: &str,
    right_column: &str,
    join_type: JoinType,
) -> Vec<Record> {
    let mut out = Vec::new();
    let mut right_matched = vec![false; right.all_records().len()];

    for l in left.all_records() {
        let mut matched = false;
        for (ri, r) in right.all_records().iter().enumerate() {
            if l.get(left_column).is_some() && l.get(left_column) == r.get(right_column) {
                matched = true;
                right_matched[ri] = true;
                out.push(merge_records(l, Some(r)));
            }
        }
        if !matched && matches!(join_type, JoinType::Left | JoinType::Full) {
            out.push(merge_records(l, None));
        }
    }

    if matches!(join_type, JoinType::Right | JoinType::Full) {
        for (ri, r) in right.all_records().iter().enumerate() {
            if !right_matched[ri] {
                out.push(merge_records_right_only(r));
            }
        }
    }

    out
}

fn merge_records(left: &Record, right: Option<&Record>) -> Record {
    let mut values = left.values.clone();
    if let Some(r) = right {
        for (k, v) in &r.values {
            values.insert(k.clone(), v.clone());
        }
    }
    Record::new(left.id, values)
}

fn merge_records_right_only(right: &Record) -> Record {
    Record::new(right.id, right.values.clone())
}

fn apply_order_by(records: &mut [Record], order_by: &[OrderKey]) {
    if order_by.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for key in order_by {
            let av = a.get(&key.column);
            let bv = b.get(&key.column);
            let cmp = match (av, bv) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.cmp(y),
            };
            let cmp = if key.ascending { cmp } else { cmp.reverse() };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

fn apply_offset_limit(records: &mut Vec<Record>, offset: Option<usize>, limit: Option<usize>) {
    let offset = offset.unwrap_or(0);
    if offset >= records.len() {
        records.clear();
        return;
    }
    records.drain(0..offset);
    if let Some(limit) = limit {
        records.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::SqlParser;
    use crate::table::column::ColumnType;
    use crate::table::ColumnDef;

    fn executor() -> QueryExecutor {
        let database = Arc::new(parking_lot::RwLock::new(Database::new()));
        let lock_manager = Arc::new(LockManager::new());
        let transaction_manager = Arc::new(TransactionManager::new(lock_manager.clone()));
        QueryExecutor::new(database, lock_manager, transaction_manager)
    }

    fn create_users(executor: &QueryExecutor) {
        let columns = vec![
            ColumnDef::new("id", ColumnType::Integer, true, false, false, false, None),
            ColumnDef::new("name", ColumnType::Varchar, false, false, false, false, None),
        ];
        executor
            .execute(&Statement::CreateTable {
                table: "users".to_string(),
                columns,
            })
            .unwrap();
    }

    #[test]
    fn test_s1_point_select_with_index() {
        let executor = executor();
        create_users(&executor);
        let parser = SqlParser::new();

        executor
            .execute(&parser.parse("INSERT INTO users (id, name) VALUES (1, 'Alice')").unwrap())
            .unwrap();
        executor
            .execute(&parser.parse("INSERT INTO users (id, name) VALUES (2, 'Bob')").unwrap())
            .unwrap();

        let result = executor
            .execute(&parser.parse("SELECT * FROM users WHERE id = 2").unwrap())
            .unwrap();

        match result {
            QueryResult::Select { records } => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].get("name"), Some("Bob"));
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_s2_duplicate_primary_key() {
        let executor = executor();
        let parser = SqlParser::new();
        executor
            .execute(&parser.parse("CREATE TABLE k (id INTEGER PRIMARY KEY)").unwrap())
            .unwrap();
        executor
            .execute(&parser.parse("INSERT INTO k (id) VALUES (1)").unwrap())
            .unwrap();

        let err = executor
            .execute(&parser.parse("INSERT INTO k (id) VALUES (1)").unwrap())
            .unwrap_err();
        assert!(format!("{err}").contains("Duplicate primary key value: 1"));
    }

    #[test]
    fn test_s3_order_by_two_columns() {
        let executor = executor();
        let parser = SqlParser::new();
        executor
            .execute(
                &parser
                    .parse("CREATE TABLE p (id INT PRIMARY KEY, cat VARCHAR(10), price INT)")
                    .unwrap(),
            )
            .unwrap();
        for (id, cat, price) in [(1, "E", "100"), (2, "E", "050"), (3, "B", "015"), (4, "B", "025")] {
            let sql = format!("INSERT INTO p (id, cat, price) VALUES ({id}, '{cat}', '{price}')");
            executor.execute(&parser.parse(&sql).unwrap()).unwrap();
        }

        let result = executor
            .execute(&parser.parse("SELECT * FROM p ORDER BY cat ASC, price DESC").unwrap())
            .unwrap();

        match result {
            QueryResult::Select { records } => {
                let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
                assert_eq!(ids, vec![4, 3, 1, 2]);
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_s4_limit_offset() {
        let executor = executor();
        let parser = SqlParser::new();
        executor
            .execute(&parser.parse("CREATE TABLE u (id INT PRIMARY KEY, name VARCHAR(10))").unwrap())
            .unwrap();
        for id in 1..=20 {
            let sql = format!("INSERT INTO u (id, name) VALUES ({id}, 'n{id}')");
            executor.execute(&parser.parse(&sql).unwrap()).unwrap();
        }

        let result = executor
            .execute(&parser.parse("SELECT * FROM u LIMIT 5 OFFSET 10").unwrap())
            .unwrap();
        match result {
            QueryResult::Select { records } => {
                assert_eq!(records.len(), 5);
                let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
                assert_eq!(ids, vec![11, 12, 13, 14, 15]);
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_s6_is_null() {
        let executor = executor();
        let parser = SqlParser::new();
        executor
            .execute(&parser.parse("CREATE TABLE e (id INT PRIMARY KEY, mgr INT)").unwrap())
            .unwrap();
        executor
            .execute(&parser.parse("INSERT INTO e (id, mgr) VALUES (1, NULL)").unwrap())
            .unwrap();
        executor
            .execute(&parser.parse("INSERT INTO e (id, mgr) VALUES (2, 1)").unwrap())
            .unwrap();

        let result = executor
            .execute(&parser.parse("SELECT * FROM e WHERE mgr IS NULL").unwrap())
            .unwrap();
        match result {
            QueryResult::Select { records } => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].id, 1);
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_locks_released_after_execute() {
        let executor = executor();
        create_users(&executor);
        let parser = SqlParser::new();
        executor
            .execute(&parser.parse("SELECT * FROM users").unwrap())
            .unwrap();
        assert!(executor.lock_manager.held_resources(1).is_empty());
    }
}
