//! Error types for quarry

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for quarry operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for building, compiling and running queries
#[derive(Debug, Error)]
pub enum OrmError {
    /// A query was compiled without a target table
    #[error("Query has no table; call `Query::table` or `from` before executing")]
    MissingTable,

    /// Relationship keys could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Builder misuse detected before any SQL was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The executor rejected a statement
    #[error("Query failed: {source} (sql: {sql})")]
    Execution {
        sql: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A to-one lookup matched more rows than allowed
    #[error("Expected at most {expected} row(s), got {got}")]
    TooManyRows { expected: usize, got: usize },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a relationship configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a driver error together with the statement that caused it
    pub fn execution(
        sql: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Execution {
            sql: sql.into(),
            source: Box::new(source),
        }
    }

    pub fn too_many_rows(expected: usize, got: usize) -> Self {
        Self::TooManyRows { expected, got }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The SQL text attached to an execution failure, if any
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
