//! Simulated Dashboard Feed

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use storage::{simulated_readings, Reading};

use crate::identity::CallerIdentity;

const SIMULATED_POINTS: usize = 50;

/// One point of the feed, keyed the way the dashboard charts read it
#[derive(Debug, Serialize)]
pub struct FeedPoint {
    /// ISO 8601 UTC with millisecond precision
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
}

impl From<Reading> for FeedPoint {
    fn from(reading: Reading) -> Self {
        Self {
            time: reading.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            temperature: reading.temperature,
            humidity: reading.humidity,
        }
    }
}

/// Response for the simulated feed
#[derive(Debug, Serialize)]
pub struct IotDataResponse {
    pub user: Option<String>,
    pub data: Vec<FeedPoint>,
}

/// Get a synthetic hourly series ending now
pub async fn get_iot_data(identity: CallerIdentity) -> Json<IotDataResponse> {
    let data = simulated_readings(Utc::now(), SIMULATED_POINTS)
        .into_iter()
        .map(FeedPoint::from)
        .collect();

    Json(IotDataResponse {
        user: identity.0,
        data,
    })
}
