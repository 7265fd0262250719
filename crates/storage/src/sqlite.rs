//! SQLite Query Executor

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::query::{ParameterizedQuery, QueryExecutor, QueryParam};
use crate::{Reading, StorageError};

/// [`QueryExecutor`] over a read-only SQLite pool.
///
/// Expects `timestamp` as INTEGER Unix seconds and `humidity`/`temperature`
/// as REAL columns.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Open a read-only pool for the given `sqlite://` URL
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        info!("Connected to SQLite store at {}", url);
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, query: &ParameterizedQuery) -> Result<Vec<Reading>, StorageError> {
        let sql = query.to_numbered()?;
        debug!(sql = %sql, params = ?query.params, "Executing query");

        let mut statement = sqlx::query(&sql);
        for (_, param) in &query.params {
            statement = match *param {
                QueryParam::Int64(value) => statement.bind(value),
            };
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(decode_reading).collect()
    }
}

fn decode_reading(row: &SqliteRow) -> Result<Reading, StorageError> {
    let seconds: i64 = row
        .try_get("timestamp")
        .map_err(|e| StorageError::Decode(e.to_string()))?;
    let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| StorageError::Decode(format!("timestamp {} out of range", seconds)))?;

    Ok(Reading {
        timestamp,
        humidity: row
            .try_get("humidity")
            .map_err(|e| StorageError::Decode(e.to_string()))?,
        temperature: row
            .try_get("temperature")
            .map_err(|e| StorageError::Decode(e.to_string()))?,
    })
}
