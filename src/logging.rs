//! Logging and tracing setup.
//!
//! The service emits one JSON object per event. Notable events:
//! - `warn` on every rejected API token, with an 8-hex-digit fingerprint of
//!   the presented value instead of the value itself
//! - `error` when no API token is configured and a protected route is hit
//! - `error` on failed agent writes (create, update, delete), which the
//!   repository reports as `false` rather than an error
//! - `info` on every successful write
//! - request spans from `tower_http`'s trace layer

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with JSON formatting.
///
/// Reads log level from RUST_LOG environment variable.
/// Defaults to `incentive_admin=info,tower_http=info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("incentive_admin=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Initialize tracing for tests (human-readable format, no JSON).
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("incentive_admin=debug")
        .try_init();
}
