//! Crate-wide error type.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds a caller of [`crate::engine::Engine`] or any subsystem may observe.
///
/// Each variant carries a one-line human message via its `#[error(...)]`
/// attribute, per the propagation policy: parse, schema, constraint, and
/// argument errors are raised synchronously; I/O errors during a buffer
/// flush are fatal; audit-log failures are logged, never raised.
#[derive(Error, Debug)]
pub enum Error {
    /// Input failed every statement pattern, or a where-clause was malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Reference to a missing table/column, or a duplicate table/index name.
    #[error("schema error: {0}")]
    Schema(String),

    /// Primary-key or unique-constraint violation, or a NOT NULL omission.
    #[error("constraint error: {0}")]
    Constraint(String),

    /// Disk read/write/allocate failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine not running, or commit/abort of a non-active transaction.
    #[error("state error: {0}")]
    State(String),

    /// Failure to acquire a lock. Reserved: the single-granularity lock
    /// manager in this engine never actually raises this today.
    #[error("lock error: {0}")]
    Lock(String),

    /// A prepared-statement parameter was out of range or left unset.
    #[error("argument error: {0}")]
    Argument(String),

    /// Wraps any of the above with the facade's outer "SQL execution
    /// failed" prefix, letting callers distinguish user-level errors
    /// from an opaque internal kind by matching on the outer variant.
    #[error("SQL execution failed: {0}")]
    Sql(Box<Error>),
}

impl Error {
    /// Wrap `self` with the facade's outer prefix, unless it already is one.
    pub fn into_sql_error(self) -> Error {
        match self {
            Error::Sql(_) => self,
            other => Error::Sql(Box::new(other)),
        }
    }

    /// True for the error kinds that `execute_sql` raises synchronously
    /// rather than treating as fatal engine state.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Parse(_) | Error::Schema(_) | Error::Constraint(_) | Error::Argument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_one_line() {
        let e = Error::Constraint("Duplicate primary key value: 1".to_string());
        assert_eq!(format!("{e}"), "constraint error: Duplicate primary key value: 1");
        assert!(!format!("{e}").contains('\n'));
    }

    #[test]
    fn test_sql_wrap_prefix() {
        let e = Error::Parse("unsupported statement".to_string()).into_sql_error();
        assert_eq!(
            format!("{e}"),
            "SQL execution failed: parse error: unsupported statement"
        );
    }

    #[test]
    fn test_sql_wrap_idempotent() {
        let e = Error::State("not running".to_string())
            .into_sql_error()
            .into_sql_error();
        assert_eq!(format!("{e}"), "SQL execution failed: state error: not running");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn test_is_user_error() {
        assert!(Error::Parse("x".into()).is_user_error());
        assert!(!Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")).is_user_error());
    }
}
