//! Range Validator

use crate::error::ValidationError;
use tracing::debug;

/// 30 days in milliseconds
pub const DEFAULT_MAX_SPAN_MS: i64 = 30 * 24 * 60 * 60 * 1000;

const MS_PER_SECOND: i64 = 1000;

/// Limits applied to requested ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePolicy {
    /// Largest allowed `end - start`, in milliseconds
    pub max_span_ms: i64,
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self {
            max_span_ms: DEFAULT_MAX_SPAN_MS,
        }
    }
}

/// A range that passed validation, in whole Unix seconds.
///
/// Can only be built by [`RangeValidator::validate`] and is deliberately not
/// `Clone`, so each validated range drives at most one query.
///
/// Ordering is strict in milliseconds, but flooring to seconds only
/// guarantees `start_seconds() <= end_seconds()`.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidatedTimeRange {
    start_seconds: i64,
    end_seconds: i64,
}

impl ValidatedTimeRange {
    /// Inclusive lower bound
    pub fn start_seconds(&self) -> i64 {
        self.start_seconds
    }

    /// Inclusive upper bound
    pub fn end_seconds(&self) -> i64 {
        self.end_seconds
    }
}

/// Validator for caller-supplied millisecond timestamps
#[derive(Debug, Clone, Default)]
pub struct RangeValidator {
    policy: RangePolicy,
}

impl RangeValidator {
    /// Create a validator enforcing the given policy
    pub fn new(policy: RangePolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect
    pub fn policy(&self) -> &RangePolicy {
        &self.policy
    }

    /// Validate raw `start`/`end` values.
    ///
    /// Checks run in order and stop at the first failure: presence, integer
    /// format, positivity, ordering, then span.
    pub fn validate(
        &self,
        start_raw: Option<&str>,
        end_raw: Option<&str>,
    ) -> Result<ValidatedTimeRange, ValidationError> {
        let start_raw = require("start", start_raw)?;
        let end_raw = require("end", end_raw)?;

        let start = parse_millis("start", start_raw)?;
        let end = parse_millis("end", end_raw)?;

        if start <= 0 || end <= 0 {
            return Err(ValidationError::InvalidRange(
                "timestamps must be positive".to_string(),
            ));
        }

        if start >= end {
            return Err(ValidationError::InvalidRange(format!(
                "start {} is not before end {}",
                start, end
            )));
        }

        // Both bounds are positive, so this cannot overflow.
        let span_ms = end - start;
        if span_ms > self.policy.max_span_ms {
            return Err(ValidationError::RangeTooLarge {
                span_ms,
                max_span_ms: self.policy.max_span_ms,
            });
        }

        let range = ValidatedTimeRange {
            start_seconds: start / MS_PER_SECOND,
            end_seconds: end / MS_PER_SECOND,
        };
        debug!(
            start_seconds = range.start_seconds,
            end_seconds = range.end_seconds,
            "Validated time range"
        );
        Ok(range)
    }
}

fn require<'a>(name: &'static str, raw: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match raw {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingParameter(name)),
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat(name))
}
