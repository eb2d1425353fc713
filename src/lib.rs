//! ferrodb - an embeddable, single-node relational storage engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            ferrodb                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Engine facade (engine/)                    │   │
//! │  │   execute_sql / prepare_statement / CSV / backup          │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Query layer (sql/)                           │   │
//! │  │         SqlParser → QueryExecutor → QueryCache            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │          Database / Table (db/, table/)                   │   │
//! │  │     schema + records + per-column B-tree indexes          │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Transaction layer (concurrency/)                   │   │
//! │  │    TransactionManager + LockManager (no MVCC)             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Buffer pool (buffer/)                          │   │
//! │  │              bounded LRU over Page values                 │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Storage layer (storage/)                       │   │
//! │  │          DiskManager + Page + PageHeader                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - shared primitives: PageId, Error, config constants
//! - [`storage`] - disk I/O and the page format
//! - [`buffer`] - bounded LRU buffer pool
//! - [`index`] - the B-tree index structure
//! - [`concurrency`] - transaction and lock management
//! - [`table`] - table schema, records, and per-column indexes
//! - [`db`] - the named collection of tables
//! - [`sql`] - parsing, predicates, statement execution, result caching
//! - [`engine`] - the embeddable facade
//!
//! # Quick start
//! ```no_run
//! use ferrodb::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new();
//! engine.start("mydb", "./data", &EngineConfig::default()).unwrap();
//! engine.execute_sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50))").unwrap();
//! engine.execute_sql("INSERT INTO users (id, name) VALUES (1, 'Alice')").unwrap();
//! engine.stop().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod concurrency;
pub mod db;
pub mod engine;
pub mod index;
pub mod sql;
pub mod storage;
pub mod table;

pub use common::config::PAGE_SIZE;
pub use common::{Error, PageId, Result};
pub use engine::{Engine, EngineConfig};
