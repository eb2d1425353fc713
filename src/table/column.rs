//! Column definitions and the declared-type enumeration.

use crate::common::{Error, Result};

/// A column's declared type. `Varchar`'s optional length is accepted in
/// the grammar but ignored — this engine stores every value as a string
/// regardless of declared width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Varchar,
    Boolean,
    Date,
    Decimal,
}

impl ColumnType {
    /// Parse a type token from the grammar's `type` production
    /// (`INTEGER|INT|VARCHAR[(n)]|CHAR|TEXT|DATE|DATETIME|TIMESTAMP
    /// |BOOLEAN|DECIMAL|FLOAT|DOUBLE|BIGINT|SMALLINT|TINYINT`), folding
    /// synonyms onto the five canonical kinds. Any length suffix
    /// (`VARCHAR(50)`) must already be stripped by the caller.
    pub fn parse(token: &str) -> Result<Self> {
        match token.to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" | "BIGINT" | "SMALLINT" | "TINYINT" => Ok(ColumnType::Integer),
            "VARCHAR" | "CHAR" | "TEXT" => Ok(ColumnType::Varchar),
            "BOOLEAN" => Ok(ColumnType::Boolean),
            "DATE" | "DATETIME" | "TIMESTAMP" => Ok(ColumnType::Date),
            "DECIMAL" | "FLOAT" | "DOUBLE" => Ok(ColumnType::Decimal),
            other => Err(Error::Schema(format!("unknown column type: {other}"))),
        }
    }
}

/// A column definition: name, declared type, and constraint flags.
///
/// Invariant: a primary-key column implies `not_null` and `unique` — this
/// is enforced by [`ColumnDef::new`], not left to the caller.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub col_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub default: Option<String>,
}

impl ColumnDef {
    pub fn new(
        name: impl Into<String>,
        col_type: ColumnType,
        primary_key: bool,
        not_null: bool,
        auto_increment: bool,
        unique: bool,
        default: Option<String>,
    ) -> Self {
        let not_null = not_null || primary_key;
        let unique = unique || primary_key;
        ColumnDef {
            name: name.into(),
            col_type,
            primary_key,
            not_null,
            auto_increment,
            unique,
            default,
        }
    }
}
