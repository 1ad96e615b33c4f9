//! Error types for dbforge

use thiserror::Error;

/// Result type alias for dbforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a database catalog
#[derive(Error, Debug)]
pub enum Error {
    /// MySQL driver error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// sqlx driver error (PostgreSQL, SQLite)
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Type conversion error
    #[error("Type conversion error: expected {expected}, got {actual}")]
    TypeConversion {
        expected: &'static str,
        actual: String,
    },

    /// Column not found in row
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The caller cancelled the context
    #[error("operation cancelled")]
    Cancelled,

    /// The context deadline elapsed
    #[error("operation timed out")]
    Timeout,

    /// The dialect is unknown or its driver feature is disabled
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),
}

impl Error {
    /// Whether this error came from the caller's context rather than the database.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Timeout)
    }
}
