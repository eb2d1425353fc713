//! SQL text in, results out: parsing, predicate evaluation, statement
//! execution, and result caching.
//!
//! - [`statement`] - the parsed statement forms
//! - [`where_clause`] - WHERE-clause predicates and their evaluation
//! - [`parser`] - regex-driven SQL text -> [`statement::Statement`]
//! - [`executor`] - statement dispatch, locking, and the SELECT pipeline
//! - [`cache`] - bounded TTL cache of SELECT results

pub mod cache;
pub mod executor;
pub mod parser;
pub mod statement;
pub mod where_clause;

pub use cache::QueryCache;
pub use executor::{QueryExecutor, QueryResult};
pub use parser::SqlParser;
pub use statement::{JoinType, OrderKey, ShowKind, Statement};
pub use where_clause::{CompareOp, Predicate};
