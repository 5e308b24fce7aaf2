//! Incentive Admin
//!
//! Administrative backend for agents, agencies, customers and subscriptions.
//! Every data endpoint is gated by a shared API token.

use sqlx::sqlite::SqlitePool;
use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod storage;

use crate::api::build_router;
use crate::auth::ApiToken;
use crate::config::Config;
use crate::storage::{
    init_schema, AgencyRepository, AgentRepository, CustomerRepository, SubscriptionRepository,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Agents with their agency relation.
    pub agents: AgentRepository,
    pub agencies: AgencyRepository,
    pub customers: CustomerRepository,
    pub subscriptions: SubscriptionRepository,
    /// Raw pool, used by the health check.
    pub pool: SqlitePool,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            agents: AgentRepository::new(pool.clone()),
            agencies: AgencyRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            pool,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init();

    tracing::info!("Starting Incentive Admin v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.url,
        "Configuration loaded"
    );

    // Connect to database
    let pool = SqlitePool::connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    init_schema(&pool).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize database schema");
        anyhow::anyhow!("Schema initialization error: {}", e)
    })?;

    tracing::info!("Database connected and schema initialized");

    let api_token = ApiToken::new(config.auth.api_token.as_str());
    if !api_token.is_configured() {
        tracing::warn!("No API token configured - every protected request will be rejected");
    }

    let app = build_router(AppState::new(pool), api_token);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
