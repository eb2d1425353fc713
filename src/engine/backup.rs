//! Logical backup/restore: a database dumped as replayable SQL text.

use crate::common::Result;
use crate::engine::Engine;
use crate::sql::QueryResult;

impl Engine {
    /// Dump every table as a `CREATE TABLE`, its rows as `INSERT`s, and
    /// its non-primary-key indexes as `CREATE INDEX`, in that order.
    pub fn backup(&self) -> Result<String> {
        let table_names = self.with_database(|db| db.table_names())?;
        let mut out = String::new();

        for name in &table_names {
            let (create_table_sql, index_columns) = self.with_database(|db| {
                let table_ref = db.get(name).expect("table_names came from this database");
                let t = table_ref.read();
                let columns = t.columns();

                let col_defs: Vec<String> = columns.iter().map(render_column_def).collect();
                let create_table_sql = format!("CREATE TABLE {name} ({});", col_defs.join(", "));

                let pk_column = columns.iter().find(|c| c.primary_key).map(|c| c.name.clone());
                let index_columns: Vec<String> = t
                    .indexed_columns()
                    .filter(|c| Some(c.to_string()) != pk_column)
                    .map(|c| c.to_string())
                    .collect();

                (create_table_sql, index_columns)
            })?;

            out.push_str(&create_table_sql);
            out.push('\n');

            let result = self.execute_sql(&format!("SELECT * FROM {name}"))?;
            if let QueryResult::Select { records } = result {
                let columns = self.with_database(|db| {
                    db.get(name)
                        .map(|t| t.read().columns().iter().map(|c| c.name.clone()).collect::<Vec<_>>())
                })??;
                for record in &records {
                    let col_list = columns.join(", ");
                    let values: Vec<String> = columns
                        .iter()
                        .map(|c| match record.get(c) {
                            Some(v) => format!("'{}'", v.replace('\'', "''")),
                            None => "NULL".to_string(),
                        })
                        .collect();
                    out.push_str(&format!(
                        "INSERT INTO {name} ({col_list}) VALUES ({});\n",
                        values.join(", ")
                    ));
                }
            }

            for (i, column) in index_columns.iter().enumerate() {
                out.push_str(&format!(
                    "CREATE INDEX {name}_{column}_idx_{i} ON {name} ({column});\n"
                ));
            }
        }

        Ok(out)
    }

    /// Replay a [`Engine::backup`] dump: split on `;`, skip blank and
    /// `--`-commented lines, execute each statement in order.
    pub fn restore(&self, backup_text: &str) -> Result<usize> {
        let mut executed = 0;
        for statement in backup_text.split(';') {
            let statement = statement.trim();
            if statement.is_empty() || statement.starts_with("--") {
                continue;
            }
            self.execute_sql(statement)?;
            executed += 1;
        }
        Ok(executed)
    }
}

fn render_column_def(col: &crate::table::ColumnDef) -> String {
    let mut parts = vec![col.name.clone(), type_name(col.col_type).to_string()];
    if col.primary_key {
        parts.push("PRIMARY KEY".to_string());
    }
    if col.auto_increment {
        parts.push("AUTO_INCREMENT".to_string());
    }
    if col.unique && !col.primary_key {
        parts.push("UNIQUE".to_string());
    }
    if col.not_null && !col.primary_key {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &col.default {
        parts.push(format!("DEFAULT '{default}'"));
    }
    parts.join(" ")
}

fn type_name(col_type: crate::table::ColumnType) -> &'static str {
    use crate::table::ColumnType;
    match col_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::Varchar => "VARCHAR",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Date => "DATE",
        ColumnType::Decimal => "DECIMAL",
    }
}
