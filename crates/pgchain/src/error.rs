//! Error types for pgchain

use std::fmt;
use thiserror::Error;

/// Result type alias for pgchain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// The piece a chain was missing when it was rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No SELECT / INSERT / DELETE was set.
    Operation,
    /// No table was set.
    Table,
    /// INSERT was set with an empty column mapping.
    InsertValues,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Operation => f.write_str("no operation set"),
            Missing::Table => f.write_str("no table set"),
            Missing::InsertValues => f.write_str("insert has no values"),
        }
    }
}

/// Error types for building and executing statements
#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain cannot be rendered yet
    #[error("Incomplete chain: {0}")]
    Incomplete(Missing),

    /// A fragment's `?` markers do not match the arguments given with it
    #[error("Argument mismatch in {fragment:?}: {markers} placeholder(s), {args} argument(s)")]
    ArgumentMismatch {
        fragment: String,
        markers: usize,
        args: usize,
    },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// More rows than expected
    #[error("Too many rows: expected {expected}, got {got}")]
    TooManyRows { expected: usize, got: usize },

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ChainError {
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

    /// Create a too-many-rows error
    pub fn too_many_rows(expected: usize, got: usize) -> Self {
        Self::TooManyRows { expected, got }
    }

    /// Create an argument mismatch error for a fragment
    pub fn argument_mismatch(fragment: impl Into<String>, markers: usize, args: usize) -> Self {
        Self::ArgumentMismatch {
            fragment: fragment.into(),
            markers,
            args,
        }
    }

    /// Check if this is an incomplete chain error
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Parse a tokio_postgres error into a more specific ChainError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{constraint}: {message}")),
                "23503" => return Self::ForeignKeyViolation(format!("{constraint}: {message}")),
                "23514" => return Self::CheckViolation(format!("{constraint}: {message}")),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ChainError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
