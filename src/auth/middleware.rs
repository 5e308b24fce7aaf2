//! Authentication middleware for axum.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::authorize;

/// Error response for authentication failures.
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// The configured shared secret.
#[derive(Clone)]
pub struct ApiToken(Arc<str>);

impl ApiToken {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// Whether a usable token is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reject the request with 401 unless it carries the configured API token.
pub async fn require_api_token(
    State(token): State<ApiToken>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if !authorize(request.headers(), token.as_str()) {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "Request rejected by API token guard"
        );
        return Err(AuthError {
            message: "Invalid API token".to_string(),
        });
    }

    Ok(next.run(request).await)
}
