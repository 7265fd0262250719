//! API Error Responses
//!
//! Every failure reaches the caller as the same generic body; only the status
//! code distinguishes bad input from store failures. The specific reason is
//! logged where the error is raised.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use serde::Serialize;
use storage::FetchError;
use thiserror::Error;

pub const GENERIC_ERROR: &str = "Unable to retrieve sensor readings";
pub const GENERIC_DETAILS: &str = "The request could not be completed";

/// Failure body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub details: &'static str,
}

/// Request failures
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed query string: {0}")]
    MalformedQuery(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedQuery(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(FetchError::Execution) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Fetch(FetchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Label for the request counter
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::MalformedQuery(_) | ApiError::Validation(_) => "invalid",
            ApiError::Fetch(FetchError::Execution) => "error",
            ApiError::Fetch(FetchError::Timeout { .. }) => "timeout",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: GENERIC_ERROR,
            details: GENERIC_DETAILS,
        };
        (self.status(), Json(body)).into_response()
    }
}
