//! Shared-secret token guard.
//!
//! Accepts the token through any of:
//! - `Authorization: Bearer <token>`
//! - `Authorization: Token <token>`
//! - `Authorization: <token>`
//! - `X-Api-Token: <token>` (only when `Authorization` is absent)

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::auth::safe_compare;

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const API_TOKEN_HEADER: &str = "x-api-token";

const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_PREFIX: &str = "Token ";

/// A header value that could not be read as text.
#[derive(Debug, Error)]
#[error("header '{0}' is not valid visible ASCII")]
pub struct InvalidHeader(pub String);

/// Anything the guard can read request headers from.
pub trait HeaderSource {
    /// Look up a header by lower-case name.
    fn header(&self, name: &str) -> Result<Option<&str>, InvalidHeader>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Result<Option<&str>, InvalidHeader> {
        self.get(name)
            .map(|v| v.to_str())
            .transpose()
            .map_err(|_| InvalidHeader(name.to_string()))
    }
}

/// Decide whether a request carries the expected API token.
///
/// Never fails: every integration problem (no token configured, unreadable
/// headers) is logged and answered with `false`.
pub fn authorize<H: HeaderSource + ?Sized>(request: &H, expected_token: &str) -> bool {
    if expected_token.trim().is_empty() {
        tracing::error!("No API token configured; set ADMIN__AUTH__API_TOKEN");
        return false;
    }

    let candidate = match candidate_token(request) {
        Ok(Some(token)) => token,
        Ok(None) => return false,
        Err(e) => {
            tracing::error!(error = %e, "Error reading API token headers");
            return false;
        }
    };

    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }

    let accepted = safe_compare(expected_token.trim(), candidate);
    if !accepted {
        tracing::warn!(
            token_fingerprint = %fingerprint(candidate),
            "Invalid API token attempted"
        );
    }
    accepted
}

/// Pick the token to validate. `Authorization` wins over `X-Api-Token`
/// whenever it is present, even if it turns out empty.
fn candidate_token<H: HeaderSource + ?Sized>(request: &H) -> Result<Option<&str>, InvalidHeader> {
    Ok(match request.header(AUTHORIZATION_HEADER)? {
        Some(value) => Some(strip_scheme(value)),
        None => request.header(API_TOKEN_HEADER)?,
    })
}

/// Remove exactly one recognised scheme prefix.
fn strip_scheme(value: &str) -> &str {
    value
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| value.strip_prefix(TOKEN_PREFIX))
        .unwrap_or(value)
}

/// Short, non-reversible identifier for a rejected token.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..4])
}
