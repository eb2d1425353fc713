//! The database: a named collection of tables.

pub mod database;

pub use database::Database;
