//! WHERE-clause predicate forms and their evaluation against a record.

use regex::Regex;

use crate::table::Record;

/// A binary comparison operator, string-lexicographic throughout — no
/// predicate in this engine ever parses a value as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A recognized WHERE predicate. Matched by the parser left-to-right
/// against the forms in the grammar; first match wins.
#[derive(Debug, Clone)]
pub enum Predicate {
    IsNull(String),
    IsNotNull(String),
    Like(String, String),
    NotLike(String, String),
    Between(String, String, String),
    NotBetween(String, String, String),
    In(String, Vec<String>),
    NotIn(String, Vec<String>),
    Compare(String, CompareOp, String),
}

impl Predicate {
    /// If this predicate is a single `column = value` equality, return
    /// the pair — the only form eligible for an indexed point lookup.
    pub fn as_single_equality(&self) -> Option<(&str, &str)> {
        match self {
            Predicate::Compare(col, CompareOp::Eq, value) => Some((col.as_str(), value.as_str())),
            _ => None,
        }
    }

    /// Evaluate this predicate against `record`.
    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Predicate::IsNull(col) => record.get(col).is_none(),
            Predicate::IsNotNull(col) => record.get(col).is_some(),
            Predicate::Like(col, pattern) => match record.get(col) {
                Some(value) => like_match(value, pattern),
                None => false,
            },
            Predicate::NotLike(col, pattern) => match record.get(col) {
                Some(value) => !like_match(value, pattern),
                None => false,
            },
            Predicate::Between(col, lo, hi) => match record.get(col) {
                Some(value) => value >= lo.as_str() && value <= hi.as_str(),
                None => false,
            },
            Predicate::NotBetween(col, lo, hi) => match record.get(col) {
                Some(value) => !(value >= lo.as_str() && value <= hi.as_str()),
                None => false,
            },
            Predicate::In(col, values) => match record.get(col) {
                Some(value) => values.iter().any(|v| v == value),
                None => false,
            },
            Predicate::NotIn(col, values) => match record.get(col) {
                Some(value) => !values.iter().any(|v| v == value),
                None => false,
            },
            Predicate::Compare(col, op, rhs) => match record.get(col) {
                Some(value) => compare(value, *op, rhs),
                None => false,
            },
        }
    }
}

fn compare(lhs: &str, op: CompareOp, rhs: &str) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Ge => lhs >= rhs,
    }
}

/// Translate a SQL `LIKE` pattern (`%` = any run, `_` = one char, all
/// other regex metacharacters literal) into an anchored regex and match.
fn like_match(value: &str, pattern: &str) -> bool {
    let mut regex_src = String::with_capacity(pattern.len() + 2);
    regex_src.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => regex_src.push_str(".*"),
            '_' => regex_src.push('.'),
            other => regex_src.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex_src.push('$');
    Regex::new(&regex_src)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}
