//! Route definitions for the API.

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{require_api_token, ApiToken};
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
            components.add_security_scheme(
                "api_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Api-Token"))),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_agents,
        handlers::create_agent,
        handlers::get_agent,
        handlers::update_agent,
        handlers::delete_agent,
        handlers::list_agencies,
        handlers::create_agency,
        handlers::get_agency,
        handlers::delete_agency,
        handlers::list_customers,
        handlers::create_customer,
        handlers::get_customer,
        handlers::list_customer_subscriptions,
        handlers::list_subscriptions,
        handlers::create_subscription,
        handlers::get_subscription,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::MessageResponse,
        crate::api::types::CreateAgentRequest,
        crate::api::types::UpdateAgentRequest,
        crate::api::types::ListAgentsResponse,
        crate::api::types::AgentResponse,
        crate::api::types::CreateAgencyRequest,
        crate::api::types::ListAgenciesResponse,
        crate::api::types::AgencyResponse,
        crate::api::types::CreateCustomerRequest,
        crate::api::types::ListCustomersResponse,
        crate::api::types::CustomerResponse,
        crate::api::types::ListCustomerSubscriptionsResponse,
        crate::api::types::CreateSubscriptionRequest,
        crate::api::types::ListSubscriptionsResponse,
        crate::api::types::SubscriptionResponse,
        crate::api::types::HealthResponse,
        crate::domain::Agent,
        crate::domain::AgentRole,
        crate::domain::AgencyRef,
        crate::domain::Agency,
        crate::domain::Customer,
        crate::domain::CustomerSubscription,
        crate::domain::SubscriptionLink,
        crate::domain::Subscription,
        crate::domain::SubscriptionStatus,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "agents", description = "Agent administration"),
        (name = "agencies", description = "Agency administration"),
        (name = "customers", description = "Customers and their subscriptions"),
        (name = "subscriptions", description = "Subscription plans"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Incentive Admin API",
        version = "0.1.0",
        description = "Administrative CRUD for agents, agencies, customers and subscriptions",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router. Everything except health and docs requires the
/// API token.
pub fn build_router(state: AppState, api_token: ApiToken) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected_routes = Router::new()
        .route(
            "/api/agents",
            get(handlers::list_agents).post(handlers::create_agent),
        )
        .route(
            "/api/agents/:id",
            get(handlers::get_agent)
                .put(handlers::update_agent)
                .delete(handlers::delete_agent),
        )
        .route(
            "/api/agencies",
            get(handlers::list_agencies).post(handlers::create_agency),
        )
        .route(
            "/api/agencies/:id",
            get(handlers::get_agency).delete(handlers::delete_agency),
        )
        .route(
            "/api/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/api/customers/:id", get(handlers::get_customer))
        .route(
            "/api/customer_subscriptions",
            get(handlers::list_customer_subscriptions),
        )
        .route(
            "/api/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route("/api/subscriptions/:id", get(handlers::get_subscription))
        .layer(middleware::from_fn_with_state(api_token, require_api_token))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health_check))
        .with_state(state);

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::storage::test_pool;

    const TOKEN: &str = "sk-test-admin-token";

    async fn app() -> Router {
        crate::logging::init_test();
        let state = AppState::new(test_pool().await);
        build_router(state, ApiToken::new(TOKEN))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {TOKEN}"))
            .header("content-type", "application/json");
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));

        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_before_handler() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/agents")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"email": "a@x.com", "role": "agent"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Invalid API token");

        // Nothing was written.
        let response = send(&app, "GET", "/api/agents", None).await;
        assert_eq!(json_body(response).await["agents"], json!([]));
    }

    #[tokio::test]
    async fn test_token_schemes() {
        let app = app().await;

        for (name, value) in [
            ("authorization", format!("Token {TOKEN}")),
            ("authorization", TOKEN.to_string()),
            ("x-api-token", TOKEN.to_string()),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/agents")
                        .header(name, value)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "scheme via {name}");
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/agents")
                    .header("authorization", "Bearer wrong-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_configured_token_rejects_everything() {
        let state = AppState::new(test_pool().await);
        let app = build_router(state, ApiToken::new(""));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/agents")
                    .header("authorization", "Bearer ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["database"], "connected");
    }

    #[tokio::test]
    async fn test_agent_crud_flow() {
        let app = app().await;

        let response = send(
            &app,
            "POST",
            "/api/agencies",
            Some(json!({"name": "Sunrise Travel", "code": "SUN"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let agency_id = json_body(response).await["agency"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            "POST",
            "/api/agents",
            Some(json!({
                "email": "a@x.com",
                "role": "regional_admin",
                "first_name": "A",
                "telephone": "555-0100",
                "agency_id": agency_id,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["success"], true);

        let agents = json_body(send(&app, "GET", "/api/agents", None).await).await;
        let agent = &agents["agents"][0];
        let id = agent["id"].as_str().unwrap().to_string();
        assert_eq!(agent["role"], "regional_admin");
        assert_eq!(agent["agency"]["code"], "SUN");

        let response = send(
            &app,
            "PUT",
            &format!("/api/agents/{id}"),
            Some(json!({"telephone": null})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", &format!("/api/agents/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let agent = json_body(response).await["agent"].clone();
        assert!(agent["telephone"].is_null());
        assert_eq!(agent["first_name"], "A");

        send(&app, "DELETE", &format!("/api/agencies/{agency_id}"), None).await;
        let response = send(&app, "GET", &format!("/api/agents/{id}"), None).await;
        let agent = json_body(response).await["agent"].clone();
        assert!(agent.get("agency").is_none());
        assert_eq!(agent["agency_id"], agency_id.as_str());

        let response = send(&app, "DELETE", &format!("/api/agents/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, "DELETE", &format!("/api/agents/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", &format!("/api/agents/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agent_validation() {
        let app = app().await;

        let response = send(
            &app,
            "POST",
            "/api/agents",
            Some(json!({"email": "a@x.com", "role": "superuser"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "POST", "/api/agents", Some(json!({"role": "agent"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            "POST",
            "/api/agents",
            Some(json!({"email": "a@x.com", "role": "agent"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(
            &app,
            "POST",
            "/api/agents",
            Some(json!({"email": "a@x.com", "role": "agent"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["success"], false);

        let agents = json_body(send(&app, "GET", "/api/agents", None).await).await;
        let id = agents["agents"][0]["id"].as_str().unwrap().to_string();

        let response = send(&app, "PUT", &format!("/api/agents/{id}"), Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            "PUT",
            &format!("/api/agents/{id}"),
            Some(json!({"role": "owner"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            "PUT",
            &format!("/api/agents/{}", uuid::Uuid::new_v4()),
            Some(json!({"first_name": "X"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_customer_and_subscription_flow() {
        let app = app().await;

        let response = send(
            &app,
            "POST",
            "/api/subscriptions",
            Some(json!({"name": "Gold", "price": 4900})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let plan_id = json_body(response).await["subscription"]["id"]
            .as_i64()
            .unwrap();

        let response = send(
            &app,
            "POST",
            "/api/customers",
            Some(json!({"name": "Sam", "email": "sam@x.com", "subscription_id": plan_id})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let customer = json_body(response).await["customer"].clone();
        assert_eq!(customer["subscriptions"][0]["status"], "active");
        assert_eq!(customer["subscriptions"][0]["name"], "Gold");

        let id = customer["id"].as_i64().unwrap();
        let response = send(&app, "GET", &format!("/api/customers/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", "/api/customers/9999", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            "POST",
            "/api/customers",
            Some(json!({"name": "Kim", "email": "kim@x.com", "subscription_id": 9999})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let customers = json_body(send(&app, "GET", "/api/customers", None).await).await;
        assert_eq!(customers["customers"].as_array().unwrap().len(), 1);

        let response = send(&app, "GET", "/api/customer_subscriptions", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let links = json_body(response).await["customer_subscriptions"].clone();
        assert_eq!(links.as_array().unwrap().len(), 1);
        assert_eq!(links[0]["customer_id"], id);
        assert_eq!(links[0]["subscription_id"], plan_id);
        assert_eq!(links[0]["status"], "active");
    }

    #[tokio::test]
    async fn test_customer_subscriptions_require_token() {
        let app = app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/customer_subscriptions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_ids() {
        let app = app().await;

        for uri in ["/api/agents/not-a-uuid", "/api/agencies/nope", "/api/customers/abc"] {
            let response = send(&app, "GET", uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = json_body(response).await;
            assert_eq!(body["code"], "MALFORMED_REQUEST", "{uri}");
            assert!(body["details"].is_string(), "{uri}");
        }

        let response = send(
            &app,
            "PUT",
            "/api/agents/not-a-uuid",
            Some(json!({"first_name": "X"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // No agent can have a non-UUID id, so deleting one is a no-op.
        let response = send(&app, "DELETE", "/api/agents/not-a-uuid", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
    }

    #[tokio::test]
    async fn test_malformed_body_reports_details() {
        let app = app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/agents")
                    .header("authorization", format!("Bearer {TOKEN}"))
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Malformed request");
        assert!(body["details"].is_string());
    }
}
