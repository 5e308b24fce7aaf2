//! HTTP API layer.
//!
//! Provides REST endpoints for agents, agencies, customers and subscriptions.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
