//! RFC-4180 CSV import/export, driven entirely through `execute_sql`
//! so import exercises the same INSERT path a caller would.

use crate::common::{Error, Result};
use crate::engine::Engine;

impl Engine {
    /// Import `csv_text` into `table`. The first line is a header whose
    /// names must match `table`'s columns; empty fields become NULL.
    /// Each data row becomes one INSERT.
    pub fn import_csv(&self, table: &str, csv_text: &str) -> Result<usize> {
        let mut lines = csv_text.lines();
        let header = lines
            .next()
            .ok_or_else(|| Error::Argument("CSV text has no header line".to_string()))?;
        let columns = parse_csv_line(header);

        let table_columns: Vec<String> = self
            .with_database(|db| {
                db.get(table)
                    .map(|t| t.read().columns().iter().map(|c| c.name.clone()).collect::<Vec<_>>())
            })??;

        let mut missing = columns.iter().filter(|c| !table_columns.contains(c));
        if let Some(bad) = missing.next() {
            return Err(Error::Schema(format!(
                "CSV column '{bad}' does not exist on table '{table}'"
            )));
        }

        let mut imported = 0;
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let fields = parse_csv_line(line);
            let col_list = columns.join(", ");
            let value_list: Vec<String> = fields
                .iter()
                .map(|v| {
                    if v.is_empty() {
                        "NULL".to_string()
                    } else {
                        format!("'{}'", v.replace('\'', "''"))
                    }
                })
                .collect();
            let sql = format!(
                "INSERT INTO {table} ({col_list}) VALUES ({})",
                value_list.join(", ")
            );
            self.execute_sql(&sql)?;
            imported += 1;
        }
        Ok(imported)
    }

    /// Export every record of `table` as CSV text: a header line in
    /// table-column order, then one row per record.
    pub fn export_csv(&self, table: &str) -> Result<String> {
        let result = self.execute_sql(&format!("SELECT * FROM {table}"))?;
        let records = match result {
            crate::sql::QueryResult::Select { records } => records,
            _ => unreachable!("SELECT always returns QueryResult::Select"),
        };

        let columns: Vec<String> = self.with_database(|db| {
            db.get(table).map(|t| t.read().columns().iter().map(|c| c.name.clone()).collect::<Vec<_>>())
        })??;

        let mut out = String::new();
        out.push_str(&columns.iter().map(|c| escape_csv_field(c)).collect::<Vec<_>>().join(","));
        out.push('\n');
        for record in &records {
            let row: Vec<String> = columns
                .iter()
                .map(|c| escape_csv_field(record.get(c).unwrap_or("")))
                .collect();
            out.push_str(&row.join(","));
            out.push('\n');
        }
        Ok(out)
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV line on commas, honoring double-quoted fields with
/// `""`-escaped inner quotes.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;

    fn engine_with_users() -> (Engine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new();
        engine.start("test", dir.path(), &EngineConfig::default()).unwrap();
        engine
            .execute_sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50), note VARCHAR(50))")
            .unwrap();
        (engine, dir)
    }

    #[test]
    fn test_import_then_export_round_trip() {
        let (engine, _dir) = engine_with_users();
        let csv = "id,name,note\n1,Alice,\n2,Bob,hello world\n";
        let imported = engine.import_csv("users", csv).unwrap();
        assert_eq!(imported, 2);

        let exported = engine.export_csv("users").unwrap();
        assert!(exported.starts_with("id,name,note\n"));
        assert!(exported.contains("1,Alice,\n"));
        assert!(exported.contains("2,Bob,hello world\n"));
    }

    #[test]
    fn test_export_quotes_fields_with_commas() {
        let (engine, _dir) = engine_with_users();
        engine
            .execute_sql("INSERT INTO users (id, name, note) VALUES (1, 'Alice', 'a, b')")
            .unwrap();
        let exported = engine.export_csv("users").unwrap();
        assert!(exported.contains("\"a, b\""));
    }

    #[test]
    fn test_import_rejects_unknown_column() {
        let (engine, _dir) = engine_with_users();
        let csv = "id,ghost\n1,x\n";
        assert!(engine.import_csv("users", csv).is_err());
    }
}
