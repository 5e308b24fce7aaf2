//! Storage layer.
//!
//! Provides database access via SQLx with SQLite.

mod agencies;
mod agents;
mod customers;
mod models;
mod schema;

pub use agencies::AgencyRepository;
pub use agents::AgentRepository;
pub use customers::{CustomerRepository, SubscriptionRepository};
pub use schema::init_schema;

/// Single-connection in-memory database with the schema applied.
///
/// Every `sqlite::memory:` connection is its own database, so the pool is
/// pinned to one connection that never expires.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::sqlite::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    init_schema(&pool).await.expect("Failed to init schema");
    pool
}
