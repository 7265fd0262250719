//! Time Range Validation
//!
//! Turns the untrusted `start`/`end` query parameters of a readings request
//! into a bounded, ordered range of whole Unix seconds.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{RangePolicy, RangeValidator, ValidatedTimeRange, DEFAULT_MAX_SPAN_MS};
