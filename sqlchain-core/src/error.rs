//! Error types for sqlchain

use thiserror::Error;

/// Errors raised at the execution boundary.
///
/// Building a statement never fails; these only come from a [`Connection`]
/// or [`Statement`] implementation and are folded into
/// [`Execution`](crate::Execution) by [`QueryBuilder::execute`].
///
/// [`Connection`]: crate::Connection
/// [`Statement`]: crate::Statement
/// [`QueryBuilder::execute`]: crate::QueryBuilder::execute
#[derive(Error, Debug)]
pub enum Error {
    /// No connection was supplied and the provider could not produce one
    #[error("No database connection available")]
    ConnectionUnavailable,

    /// The driver refused to prepare the statement
    #[error("Failed to prepare statement: {message} [{sql}]")]
    Prepare { sql: String, message: String },

    /// The driver rejected the prepared and bound statement
    #[error("Failed to execute statement: {message} [{sql}]")]
    Execute { sql: String, message: String },

    /// A placeholder in the statement text has no bound value
    #[error("Placeholder ':{name}' has no bound value")]
    UnboundPlaceholder { name: String },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error, e.g. while starting the adapter's runtime
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A read was attempted before a successful execution
    #[error("No result set available")]
    NoResult,
}

/// Convenience Result type for sqlchain operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new prepare error
    pub fn prepare(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Prepare {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a new execute error
    pub fn execute(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execute {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a new unbound placeholder error
    pub fn unbound_placeholder(name: impl Into<String>) -> Self {
        Self::UnboundPlaceholder { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_error() {
        let err = Error::prepare("SELECT * FROM `t` WHERE", "syntax error");
        assert!(matches!(err, Error::Prepare { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to prepare statement: syntax error [SELECT * FROM `t` WHERE]"
        );
    }

    #[test]
    fn test_execute_error() {
        let err = Error::execute("DELETE FROM `t`", "database is locked");
        assert!(matches!(err, Error::Execute { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to execute statement: database is locked [DELETE FROM `t`]"
        );
    }

    #[test]
    fn test_unbound_placeholder_error() {
        let err = Error::unbound_placeholder("p3");
        assert_eq!(err.to_string(), "Placeholder ':p3' has no bound value");
    }

    #[test]
    fn test_connection_unavailable_display() {
        assert_eq!(
            Error::ConnectionUnavailable.to_string(),
            "No database connection available"
        );
    }
}
