//! Named mapping from table name to table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{Error, Result};
use crate::table::Table;

/// Holds every table in a database, keyed by name. Table names are
/// unique; [`Database::get`] of a missing name fails with a schema
/// error.
///
/// Each table is wrapped in its own `RwLock` so the executor can take a
/// shared (read) or exclusive (write) guard matching the lock mode it
/// already obtained from the [`crate::concurrency::LockManager`] — the
/// lock manager provides the statement-scoped logical serialization the
/// spec describes; the `RwLock` satisfies Rust's aliasing rules for the
/// underlying shared, mutable state.
#[derive(Default)]
pub struct Database {
    tables: HashMap<String, Arc<RwLock<Table>>>,
}

impl Database {
    pub fn new() -> Self {
        Database {
            tables: HashMap::new(),
        }
    }

    pub fn create_table(&mut self, table: Table) -> Result<()> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::Schema(format!("table '{name}' already exists")));
        }
        self.tables.insert(name, Arc::new(RwLock::new(table)));
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_none() {
            return Err(Error::Schema(format!("table '{name}' does not exist")));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Schema(format!("table '{name}' does not exist")))
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::ColumnType;
    use crate::table::ColumnDef;

    fn table(name: &str) -> Table {
        Table::new(
            name,
            vec![ColumnDef::new(
                "id",
                ColumnType::Integer,
                true,
                false,
                false,
                false,
                None,
            )],
        )
    }

    #[test]
    fn test_create_and_lookup() {
        let mut db = Database::new();
        db.create_table(table("users")).unwrap();
        assert!(db.get("users").is_ok());
        assert_eq!(db.table_names(), vec!["users".to_string()]);
    }

    #[test]
    fn test_duplicate_table_name_rejected() {
        let mut db = Database::new();
        db.create_table(table("users")).unwrap();
        assert!(db.create_table(table("users")).is_err());
    }

    #[test]
    fn test_missing_table_lookup_fails() {
        let db = Database::new();
        let err = db.get("ghost").unwrap_err();
        assert!(format!("{err}").contains("does not exist"));
    }

    #[test]
    fn test_drop_table() {
        let mut db = Database::new();
        db.create_table(table("users")).unwrap();
        db.drop_table("users").unwrap();
        assert!(!db.contains("users"));
        assert!(db.drop_table("users").is_err());
    }
}
