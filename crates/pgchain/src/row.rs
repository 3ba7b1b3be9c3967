//! Row mapping traits.

use crate::error::{ChainError, ChainResult};
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust value.
///
/// # Example
///
/// ```ignore
/// use pgchain::{ChainResult, FromRow, RowExt};
///
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &tokio_postgres::Row) -> ChainResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             username: row.try_get_column("username")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> ChainResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning [`ChainError::Decode`] on failure
    fn try_get_column<T>(&self, column: &str) -> ChainResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> ChainResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| ChainError::decode(column, e.to_string()))
    }
}
