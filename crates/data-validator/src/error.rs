//! Validation Error Types

use thiserror::Error;

/// Reasons a requested time range is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Parameter absent or empty
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Parameter is not a base-10 integer
    #[error("Parameter {0} is not a valid integer timestamp")]
    InvalidFormat(&'static str),

    /// Bounds are non-positive or not strictly ordered
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Span exceeds the configured maximum
    #[error("Range of {span_ms}ms exceeds the maximum of {max_span_ms}ms")]
    RangeTooLarge { span_ms: i64, max_span_ms: i64 },
}
