//! Range Query Executor
//!
//! Builds the bounded time-range query for a [`ValidatedTimeRange`] and runs
//! it through a [`QueryExecutor`]. Failures are logged in full here and
//! surfaced to callers only as a coarse [`FetchError`].

use data_validator::ValidatedTimeRange;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::query::{ParameterizedQuery, QueryExecutor, QueryParam, TableRef};
use crate::Reading;

/// Deadline applied when none is configured
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

const START_PARAM: &str = "start_seconds";
const END_PARAM: &str = "end_seconds";

/// Caller-facing failure of a range fetch; carries no store detail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Query execution failed")]
    Execution,
    #[error("Query did not complete within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Runs time-range reading queries against one table
#[derive(Clone)]
pub struct RangeQueryExecutor {
    executor: Arc<dyn QueryExecutor>,
    table: TableRef,
    timeout: Duration,
}

impl RangeQueryExecutor {
    /// Create an executor for `table` with the given deadline
    pub fn new(executor: Arc<dyn QueryExecutor>, table: TableRef, timeout: Duration) -> Self {
        info!("Range queries target {} (timeout {:?})", table, timeout);
        Self {
            executor,
            table,
            timeout,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Inclusive, ascending range query with both bounds as bound parameters
    pub fn build_query(&self, range: &ValidatedTimeRange) -> ParameterizedQuery {
        ParameterizedQuery {
            sql: format!(
                "SELECT timestamp, humidity, temperature FROM {} \
                 WHERE timestamp BETWEEN @{} AND @{} \
                 ORDER BY timestamp ASC",
                self.table.sql_name(),
                START_PARAM,
                END_PARAM
            ),
            params: vec![
                (START_PARAM, QueryParam::Int64(range.start_seconds())),
                (END_PARAM, QueryParam::Int64(range.end_seconds())),
            ],
        }
    }

    /// Fetch readings in `range`, oldest first. Not retried.
    pub async fn fetch_readings(
        &self,
        range: ValidatedTimeRange,
    ) -> Result<Vec<Reading>, FetchError> {
        let query = self.build_query(&range);
        let start_seconds = range.start_seconds();
        let end_seconds = range.end_seconds();

        match tokio::time::timeout(self.timeout, self.executor.execute(&query)).await {
            Ok(Ok(readings)) => {
                debug!(
                    start_seconds,
                    end_seconds,
                    rows = readings.len(),
                    "Range query completed"
                );
                Ok(readings)
            }
            Ok(Err(e)) => {
                error!(
                    table = %self.table,
                    start_seconds,
                    end_seconds,
                    error = %e,
                    "Range query failed"
                );
                Err(FetchError::Execution)
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                error!(
                    table = %self.table,
                    start_seconds,
                    end_seconds,
                    timeout_ms,
                    "Range query timed out"
                );
                Err(FetchError::Timeout { timeout_ms })
            }
        }
    }
}
