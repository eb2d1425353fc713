//! Schema, record storage, and index management for a single table.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::common::{Error, Result};
use crate::index::BTree;
use crate::sql::where_clause::Predicate;
use crate::table::column::ColumnDef;
use crate::table::record::Record;

/// A table: ordered columns, an in-memory record vector, a dense
/// monotonic record-id counter, and a B-tree per indexed column.
///
/// A primary-key column is automatically indexed on construction.
pub struct Table {
    name: String,
    columns: Vec<ColumnDef>,
    column_positions: HashMap<String, usize>,
    records: Vec<Record>,
    next_record_id: i32,
    indexes: HashMap<String, BTree>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        let column_positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let mut indexes = HashMap::new();
        for col in &columns {
            if col.primary_key {
                indexes.insert(col.name.clone(), BTree::new());
            }
        }

        Table {
            name: name.into(),
            columns,
            column_positions,
            records: Vec::new(),
            next_record_id: 1,
            indexes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn indexed_columns(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(|s| s.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_positions.contains_key(name)
    }

    fn record_by_id(&self, id: i32) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Insert a new record. Every primary-key column must be present;
    /// every unique-constrained column is checked against its index (or,
    /// if not indexed, a linear scan) before the row is appended.
    pub fn insert_record(&mut self, values: IndexMap<String, String>) -> Result<i32> {
        for col in &self.columns {
            if col.primary_key && !values.contains_key(&col.name) {
                return Err(Error::Constraint(format!(
                    "primary key column '{}' is required",
                    col.name
                )));
            }
            if col.not_null && !col.primary_key && !values.contains_key(&col.name) {
                return Err(Error::Constraint(format!(
                    "column '{}' is NOT NULL",
                    col.name
                )));
            }
        }

        for col in &self.columns {
            if col.unique {
                if let Some(value) = values.get(&col.name) {
                    if self.find_by_unique(&col.name, value).is_some() {
                        let label = if col.primary_key { "primary key" } else { "unique" };
                        return Err(Error::Constraint(format!(
                            "Duplicate {label} value: {value}"
                        )));
                    }
                }
            }
        }

        let id = self.next_record_id;
        self.next_record_id += 1;
        let record = Record::new(id, values);

        for col in &self.columns {
            if let Some(value) = record.get(&col.name) {
                if let Some(index) = self.indexes.get_mut(&col.name) {
                    index.insert(value, id);
                }
            }
        }

        self.records.push(record);
        Ok(id)
    }

    fn find_by_unique(&self, column: &str, value: &str) -> Option<i32> {
        if let Some(index) = self.indexes.get(column) {
            index.search(value)
        } else {
            self.records
                .iter()
                .find(|r| r.get(column) == Some(value))
                .map(|r| r.id)
        }
    }

    /// Resolve the record ids matching `predicate` (or all records, if
    /// `predicate` is absent), using an indexed point lookup when the
    /// predicate is a single equality on an indexed column.
    fn resolve_target_ids(&self, predicate: Option<&Predicate>) -> Vec<i32> {
        match predicate {
            None => self.records.iter().map(|r| r.id).collect(),
            Some(pred) => {
                if let Some((col, value)) = pred.as_single_equality() {
                    if let Some(index) = self.indexes.get(col) {
                        return index.search(value).into_iter().collect();
                    }
                }
                self.records
                    .iter()
                    .filter(|r| pred.eval(r))
                    .map(|r| r.id)
                    .collect()
            }
        }
    }

    /// Whether the given predicate was satisfiable via an index (used by
    /// the executor's EXPLAIN output and by S1's "must consult the
    /// B-tree" expectation).
    pub fn predicate_uses_index(&self, predicate: Option<&Predicate>) -> bool {
        predicate
            .and_then(Predicate::as_single_equality)
            .map(|(col, _)| self.indexes.contains_key(col))
            .unwrap_or(false)
    }

    /// Project `columns` over every record matching `predicate`.
    pub fn select_records(&self, columns: &[String], predicate: Option<&Predicate>) -> Vec<Record> {
        self.resolve_target_ids(predicate)
            .into_iter()
            .filter_map(|id| self.record_by_id(id))
            .map(|r| r.project(columns))
            .collect()
    }

    /// All resident records, for full scans performed above this layer
    /// (joins, EXPLAIN diagnostics).
    pub fn all_records(&self) -> &[Record] {
        &self.records
    }

    /// Apply `updates` to every record matching `predicate`. Returns the
    /// number of rows changed.
    pub fn update_records(
        &mut self,
        updates: &IndexMap<String, String>,
        predicate: Option<&Predicate>,
    ) -> Result<usize> {
        let target_ids = self.resolve_target_ids(predicate);

        for col in &self.columns {
            if !col.unique {
                continue;
            }
            if let Some(new_value) = updates.get(&col.name) {
                if let Some(existing_id) = self.find_by_unique(&col.name, new_value) {
                    if !target_ids.contains(&existing_id) {
                        let label = if col.primary_key { "primary key" } else { "unique" };
                        return Err(Error::Constraint(format!(
                            "Duplicate {label} value: {new_value}"
                        )));
                    }
                }
            }
        }

        let mut changed = 0;
        for id in target_ids {
            let pos = self.records.iter().position(|r| r.id == id).unwrap();

            for col in &self.columns {
                if let Some(index) = self.indexes.get_mut(&col.name) {
                    if let Some(old_value) = self.records[pos].get(&col.name) {
                        index.delete(old_value);
                    }
                }
            }

            for (col, value) in updates {
                self.records[pos].values.insert(col.clone(), value.clone());
            }

            for col in &self.columns {
                if let Some(index) = self.indexes.get_mut(&col.name) {
                    if let Some(new_value) = self.records[pos].get(&col.name) {
                        index.insert(new_value, id);
                    }
                }
            }

            changed += 1;
        }
        Ok(changed)
    }

    /// Delete every record matching `predicate`. Returns the number of
    /// rows deleted.
    pub fn delete_records(&mut self, predicate: Option<&Predicate>) -> usize {
        let target_ids = self.resolve_target_ids(predicate);
        let mut deleted = 0;

        for id in target_ids {
            if let Some(pos) = self.records.iter().position(|r| r.id == id) {
                let record = self.records.remove(pos);
                for col in &self.columns {
                    if let Some(index) = self.indexes.get_mut(&col.name) {
                        if let Some(value) = record.get(&col.name) {
                            index.delete(value);
                        }
                    }
                }
                deleted += 1;
            }
        }
        deleted
    }

    /// Create a new index on `column`, populated by scanning existing
    /// records. Fails if the column doesn't exist or is already indexed.
    pub fn create_index(&mut self, column: &str) -> Result<()> {
        if !self.has_column(column) {
            return Err(Error::Schema(format!(
                "column '{column}' does not exist on table '{}'",
                self.name
            )));
        }
        if self.indexes.contains_key(column) {
            return Err(Error::Schema(format!(
                "column '{column}' is already indexed"
            )));
        }

        let mut index = BTree::new();
        for record in &self.records {
            if let Some(value) = record.get(column) {
                index.insert(value, record.id);
            }
        }
        self.indexes.insert(column.to_string(), index);
        Ok(())
    }

    /// Informational no-op: returns a status message.
    pub fn vacuum(&self) -> String {
        format!(
            "vacuumed table '{}' ({} rows)",
            self.name,
            self.records.len()
        )
    }

    /// Informational no-op: returns a status message.
    pub fn analyze(&self) -> String {
        format!(
            "analyzed table '{}' ({} rows, {} indexes)",
            self.name,
            self.records.len(),
            self.indexes.len()
        )
    }

}
