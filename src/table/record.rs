//! Table records.

use indexmap::IndexMap;

/// A single row. `id` is table-local, dense, and monotonic starting at 1.
///
/// Null is represented by the absence of a column's key, never by the
/// literal string `"NULL"` — that string is a parser/formatter-boundary
/// concern (the parser emits absence for an input `NULL` literal; the
/// formatter emits the literal `"NULL"` for absence), not a data-model
/// concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i32,
    pub values: IndexMap<String, String>,
}

impl Record {
    pub fn new(id: i32, values: IndexMap<String, String>) -> Self {
        Record { id, values }
    }

    /// Value of `column`, or `None` if null/absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|s| s.as_str())
    }

    /// Project this record down to `columns`, in the given order.
    /// `["*"]` returns the full record; columns that don't exist on this
    /// record are silently absent from the result.
    pub fn project(&self, columns: &[String]) -> Record {
        if columns.len() == 1 && columns[0] == "*" {
            return self.clone();
        }
        let mut values = IndexMap::new();
        for col in columns {
            if let Some(v) = self.values.get(col) {
                values.insert(col.clone(), v.clone());
            }
        }
        Record {
            id: self.id,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        let mut values = IndexMap::new();
        values.insert("id".to_string(), "1".to_string());
        values.insert("name".to_string(), "Alice".to_string());
        Record::new(1, values)
    }

    #[test]
    fn test_get_missing_is_none() {
        let r = record();
        assert_eq!(r.get("name"), Some("Alice"));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn test_project_star() {
        let r = record();
        let projected = r.project(&["*".to_string()]);
        assert_eq!(projected, r);
    }

    #[test]
    fn test_project_subset_order_and_missing() {
        let r = record();
        let projected = r.project(&["name".to_string(), "ghost".to_string()]);
        assert_eq!(projected.values.len(), 1);
        assert_eq!(projected.get("name"), Some("Alice"));
        assert_eq!(projected.get("ghost"), None);
    }
}
