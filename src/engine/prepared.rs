//! Positional (1-indexed) parameter substitution into `?` placeholders.

use std::collections::HashMap;

use crate::common::{Error, Result};

/// A bound parameter value. Strings are rendered single-quoted with
/// `'` doubled; `Null` renders as the bare keyword `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i32),
    Long(i64),
    Bool(bool),
    Null,
}

impl ParamValue {
    fn render(&self) -> String {
        match self {
            ParamValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Long(l) => l.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Null => "NULL".to_string(),
        }
    }
}

/// SQL text with `?` placeholders, plus the positional parameters
/// bound to it so far.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: String,
    params: HashMap<usize, ParamValue>,
}

impl PreparedStatement {
    pub fn new(sql: &str) -> Self {
        PreparedStatement {
            sql: sql.to_string(),
            params: HashMap::new(),
        }
    }

    /// Bind `value` to the 1-indexed placeholder `index`.
    pub fn bind(&mut self, index: usize, value: ParamValue) {
        self.params.insert(index, value);
    }

    /// Substitute every `?` with its bound value, in left-to-right
    /// order. An unset parameter is an [`Error::Argument`].
    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(self.sql.len());
        let mut index = 0usize;
        for ch in self.sql.chars() {
            if ch == '?' {
                index += 1;
                let value = self.params.get(&index).ok_or_else(|| {
                    Error::Argument(format!("parameter {index} is unset"))
                })?;
                out.push_str(&value.render());
            } else {
                out.push(ch);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_positional_params() {
        let mut ps = PreparedStatement::new("INSERT INTO t (id, name) VALUES (?, ?)");
        ps.bind(1, ParamValue::Int(5));
        ps.bind(2, ParamValue::Str("O'Brien".to_string()));
        assert_eq!(
            ps.render().unwrap(),
            "INSERT INTO t (id, name) VALUES (5, 'O''Brien')"
        );
    }

    #[test]
    fn test_null_renders_bare_keyword() {
        let mut ps = PreparedStatement::new("INSERT INTO t (mgr) VALUES (?)");
        ps.bind(1, ParamValue::Null);
        assert_eq!(ps.render().unwrap(), "INSERT INTO t (mgr) VALUES (NULL)");
    }

    #[test]
    fn test_unset_parameter_is_argument_error() {
        let ps = PreparedStatement::new("SELECT * FROM t WHERE id = ?");
        let err = ps.render().unwrap_err();
        assert!(format!("{err}").contains("unset"));
    }
}
