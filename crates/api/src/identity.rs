//! Caller Identity
//!
//! The upstream proxy asserts the caller's email in a trusted header. The
//! value is used for log attribution only and is never enforced here.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::AppState;

/// Prefix the proxy puts in front of the email
const ACCOUNT_PREFIX: &str = "accounts.google.com:";

/// Email asserted by the proxy, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Option<String>);

impl CallerIdentity {
    pub fn email(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Read the caller email from `header`, dropping the account prefix
pub fn resolve_identity(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    let raw = headers.get(header)?.to_str().ok()?.trim();
    let email = raw.strip_prefix(ACCOUNT_PREFIX).unwrap_or(raw).trim();
    if email.is_empty() {
        None
    } else {
        Some(email.to_string())
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let email = resolve_identity(&parts.headers, &state.identity_header);
        match &email {
            Some(email) => debug!(user = %email, "Caller identified by proxy header"),
            None => warn!(header = %state.identity_header, "Identity header not present"),
        }
        Ok(CallerIdentity(email))
    }
}
