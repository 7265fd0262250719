//! Range Reading Routes

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use storage::Reading;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::identity::CallerIdentity;
use crate::AppState;

/// Query parameters for the range endpoint, both Unix epoch milliseconds
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Get readings between `start` and `end`, oldest first
pub async fn get_range_readings(
    State(state): State<Arc<AppState>>,
    identity: CallerIdentity,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let result = fetch_range(&state, &identity, params).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    metrics::counter!("range_readings_requests_total", "outcome" => outcome).increment(1);

    result.map(Json)
}

async fn fetch_range(
    state: &AppState,
    identity: &CallerIdentity,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Vec<Reading>, ApiError> {
    let user = identity.email().unwrap_or("-");

    let Query(params) = params.map_err(|e| {
        warn!(user, reason = %e, "Rejected range request");
        ApiError::MalformedQuery(e.to_string())
    })?;

    let range = state
        .validator
        .validate(params.start.as_deref(), params.end.as_deref())
        .map_err(|e| {
            warn!(user, reason = %e, "Rejected range request");
            ApiError::from(e)
        })?;

    info!(
        user,
        start_seconds = range.start_seconds(),
        end_seconds = range.end_seconds(),
        "Fetching range readings"
    );

    let readings = state.readings.fetch_readings(range).await?;
    info!(user, rows = readings.len(), "Range readings served");
    Ok(readings)
}
