//! Storage Layer
//!
//! Sensor readings, the query-execution interface they are fetched through,
//! and the range query executor that drives it.

mod query;
mod range_query;
mod reading;
mod sqlite;

pub use query::{ParameterizedQuery, QueryExecutor, QueryParam, TableRef};
pub use range_query::{FetchError, RangeQueryExecutor, DEFAULT_QUERY_TIMEOUT};
pub use reading::{simulated_readings, Reading};
pub use sqlite::SqliteExecutor;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Row decode error: {0}")]
    Decode(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}
