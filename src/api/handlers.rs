//! HTTP request handlers.
//!
//! Every handler here except [`health_check`] sits behind the API token
//! middleware, so none of them re-check credentials.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::types::*;
use crate::error::{AdminError, AdminResult};
use crate::AppState;

/// Turn a body rejection into our 400 response instead of axum's plain text.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AdminResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AdminError::Malformed(e.body_text()))
}

/// Same as [`json_body`], for path parameters.
fn path_param<T>(param: Result<Path<T>, PathRejection>) -> AdminResult<T> {
    param
        .map(|Path(value)| value)
        .map_err(|e| AdminError::Malformed(e.body_text()))
}

// ==================== Agents ====================

/// List all agents, newest first.
///
/// GET /api/agents
#[utoipa::path(
    get,
    path = "/api/agents",
    responses(
        (status = 200, description = "All agents", body = ListAgentsResponse),
        (status = 401, description = "Invalid API token"),
        (status = 500, description = "Internal error")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agents"
)]
pub async fn list_agents(State(state): State<AppState>) -> AdminResult<Json<ListAgentsResponse>> {
    let agents = state.agents.list().await?;

    Ok(Json(ListAgentsResponse { agents }))
}

/// Create an agent.
///
/// POST /api/agents
#[utoipa::path(
    post,
    path = "/api/agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created", body = MessageResponse),
        (status = 400, description = "Missing email or invalid role"),
        (status = 401, description = "Invalid API token"),
        (status = 500, description = "Agent could not be stored", body = MessageResponse)
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agents"
)]
pub async fn create_agent(
    State(state): State<AppState>,
    payload: Result<Json<CreateAgentRequest>, JsonRejection>,
) -> AdminResult<(StatusCode, Json<MessageResponse>)> {
    let new_agent = json_body(payload)?.into_new_agent()?;

    if state.agents.create(&new_agent).await {
        Ok((
            StatusCode::CREATED,
            Json(MessageResponse::new("Agent created successfully", true)),
        ))
    } else {
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::new("Couldn't create agent", false)),
        ))
    }
}

/// Get one agent.
///
/// GET /api/agents/{id}
#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    params(("id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent details", body = AgentResponse),
        (status = 400, description = "Malformed agent ID"),
        (status = 401, description = "Invalid API token"),
        (status = 404, description = "Agent not found"),
        (status = 500, description = "Internal error")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agents"
)]
pub async fn get_agent(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AdminResult<Json<AgentResponse>> {
    let id = path_param(id)?;
    let agent = state
        .agents
        .get_by_id(id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("Agent {} not found", id)))?;

    Ok(Json(AgentResponse { agent }))
}

/// Partially update an agent.
///
/// PUT /api/agents/{id}
#[utoipa::path(
    put,
    path = "/api/agents/{id}",
    params(("id" = Uuid, Path, description = "Agent ID")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated", body = MessageResponse),
        (status = 400, description = "Invalid or no fields"),
        (status = 401, description = "Invalid API token"),
        (status = 404, description = "Agent not found"),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agents"
)]
pub async fn update_agent(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAgentRequest>, JsonRejection>,
) -> AdminResult<(StatusCode, Json<MessageResponse>)> {
    let id = path_param(id)?;
    let patch = json_body(payload)?.into_patch()?;
    if patch.is_empty() {
        return Err(AdminError::BadRequest("No fields to update".to_string()));
    }

    if state.agents.get_by_id(id).await?.is_none() {
        return Err(AdminError::NotFound(format!("Agent {} not found", id)));
    }

    if state.agents.update(id, &patch).await {
        Ok((
            StatusCode::OK,
            Json(MessageResponse::new("Agent updated successfully", true)),
        ))
    } else {
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::new("Couldn't update agent", false)),
        ))
    }
}

/// Delete an agent. Unknown ids succeed.
///
/// DELETE /api/agents/{id}
#[utoipa::path(
    delete,
    path = "/api/agents/{id}",
    params(("id" = String, Path, description = "Agent ID; non-UUID values match nothing")),
    responses(
        (status = 200, description = "Agent deleted", body = MessageResponse),
        (status = 401, description = "Invalid API token"),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agents"
)]
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<MessageResponse>) {
    // Agent ids are UUIDs, so anything else matches no row.
    let deleted = match Uuid::parse_str(&id) {
        Ok(id) => state.agents.delete(id).await,
        Err(_) => true,
    };

    if deleted {
        (
            StatusCode::OK,
            Json(MessageResponse::new("Agent deleted successfully", true)),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::new("Couldn't delete agent", false)),
        )
    }
}

// ==================== Agencies ====================

/// List agencies alphabetically.
#[utoipa::path(
    get,
    path = "/api/agencies",
    responses(
        (status = 200, description = "All agencies", body = ListAgenciesResponse),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agencies"
)]
pub async fn list_agencies(
    State(state): State<AppState>,
) -> AdminResult<Json<ListAgenciesResponse>> {
    let agencies = state.agencies.list().await?;

    Ok(Json(ListAgenciesResponse { agencies }))
}

/// Create an agency.
#[utoipa::path(
    post,
    path = "/api/agencies",
    request_body = CreateAgencyRequest,
    responses(
        (status = 201, description = "Agency created", body = AgencyResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agencies"
)]
pub async fn create_agency(
    State(state): State<AppState>,
    payload: Result<Json<CreateAgencyRequest>, JsonRejection>,
) -> AdminResult<(StatusCode, Json<AgencyResponse>)> {
    let agency = json_body(payload)?.into_agency()?;
    state.agencies.create(&agency).await?;

    Ok((StatusCode::CREATED, Json(AgencyResponse { agency })))
}

/// Get one agency.
#[utoipa::path(
    get,
    path = "/api/agencies/{id}",
    params(("id" = Uuid, Path, description = "Agency ID")),
    responses(
        (status = 200, description = "Agency details", body = AgencyResponse),
        (status = 400, description = "Malformed agency ID"),
        (status = 401, description = "Invalid API token"),
        (status = 404, description = "Agency not found")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agencies"
)]
pub async fn get_agency(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AdminResult<Json<AgencyResponse>> {
    let id = path_param(id)?;
    let agency = state
        .agencies
        .get_by_id(id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("Agency {} not found", id)))?;

    Ok(Json(AgencyResponse { agency }))
}

/// Delete an agency. Agents that referenced it lose their nested agency.
#[utoipa::path(
    delete,
    path = "/api/agencies/{id}",
    params(("id" = String, Path, description = "Agency ID; non-UUID values match nothing")),
    responses(
        (status = 200, description = "Agency deleted", body = MessageResponse),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "agencies"
)]
pub async fn delete_agency(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AdminResult<Json<MessageResponse>> {
    if let Ok(id) = Uuid::parse_str(&id) {
        state.agencies.delete(id).await?;
    }

    Ok(Json(MessageResponse::new("Agency deleted successfully", true)))
}

// ==================== Customers ====================

/// List customers with their subscriptions.
#[utoipa::path(
    get,
    path = "/api/customers",
    responses(
        (status = 200, description = "All customers", body = ListCustomersResponse),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
) -> AdminResult<Json<ListCustomersResponse>> {
    let customers = state.customers.list().await?;

    Ok(Json(ListCustomersResponse { customers }))
}

/// Create a customer, optionally subscribed to a plan.
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Invalid API token"),
        (status = 404, description = "Subscription plan not found")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> AdminResult<(StatusCode, Json<CustomerResponse>)> {
    let new_customer = json_body(payload)?.into_new_customer()?;

    if let Some((subscription_id, _)) = new_customer.subscription {
        if state.subscriptions.get_by_id(subscription_id).await?.is_none() {
            return Err(AdminError::NotFound(format!(
                "Subscription {} not found",
                subscription_id
            )));
        }
    }

    let id = state.customers.create(&new_customer).await?;
    let customer = state
        .customers
        .get_by_id(id)
        .await?
        .ok_or_else(|| AdminError::Internal(format!("Customer {} vanished after insert", id)))?;

    Ok((StatusCode::CREATED, Json(CustomerResponse { customer })))
}

/// Get one customer.
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = i64, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer details", body = CustomerResponse),
        (status = 400, description = "Malformed customer ID"),
        (status = 401, description = "Invalid API token"),
        (status = 404, description = "Customer not found")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AdminResult<Json<CustomerResponse>> {
    let id = path_param(id)?;
    let customer = state
        .customers
        .get_by_id(id)
        .await?
        .ok_or_else(|| AdminError::NotFound("Customer not found".to_string()))?;

    Ok(Json(CustomerResponse { customer }))
}

/// List every customer/plan link.
#[utoipa::path(
    get,
    path = "/api/customer_subscriptions",
    responses(
        (status = 200, description = "All customer subscriptions", body = ListCustomerSubscriptionsResponse),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customer_subscriptions(
    State(state): State<AppState>,
) -> AdminResult<Json<ListCustomerSubscriptionsResponse>> {
    let customer_subscriptions = state.customers.list_subscription_links().await?;

    Ok(Json(ListCustomerSubscriptionsResponse {
        customer_subscriptions,
    }))
}

// ==================== Subscriptions ====================

/// List subscription plans.
#[utoipa::path(
    get,
    path = "/api/subscriptions",
    responses(
        (status = 200, description = "All plans", body = ListSubscriptionsResponse),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "subscriptions"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> AdminResult<Json<ListSubscriptionsResponse>> {
    let subscriptions = state.subscriptions.list().await?;

    Ok(Json(ListSubscriptionsResponse { subscriptions }))
}

/// Create a subscription plan.
#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Plan created", body = SubscriptionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Invalid API token")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "subscriptions"
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> AdminResult<(StatusCode, Json<SubscriptionResponse>)> {
    let new_subscription = json_body(payload)?.into_new_subscription()?;

    let id = state.subscriptions.create(&new_subscription).await?;
    let subscription = state.subscriptions.get_by_id(id).await?.ok_or_else(|| {
        AdminError::Internal(format!("Subscription {} vanished after insert", id))
    })?;

    Ok((StatusCode::CREATED, Json(SubscriptionResponse { subscription })))
}

/// Get one subscription plan.
#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}",
    params(("id" = i64, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Plan details", body = SubscriptionResponse),
        (status = 400, description = "Malformed plan ID"),
        (status = 401, description = "Invalid API token"),
        (status = 404, description = "Plan not found")
    ),
    security(("api_token" = []), ("bearer_auth" = [])),
    tag = "subscriptions"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AdminResult<Json<SubscriptionResponse>> {
    let id = path_param(id)?;
    let subscription = state
        .subscriptions
        .get_by_id(id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("Subscription {} not found", id)))?;

    Ok(Json(SubscriptionResponse { subscription }))
}

// ==================== Health ====================

/// Liveness and database connectivity.
///
/// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
