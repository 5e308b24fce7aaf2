//! API request and response types.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Agency, Agent, AgentPatch, AgentRole, Customer, NewAgent, NewCustomer, NewSubscription,
    Subscription, SubscriptionLink, SubscriptionStatus,
};
use crate::error::{AdminError, AdminResult};

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Paired with `#[serde(default)]`: a missing key stays `None`, `null`
/// becomes `Some(None)` and a value becomes `Some(Some(v))`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim a free-text field; blank counts as no value.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_text(field: &str, value: String) -> AdminResult<String> {
    non_blank(Some(value)).ok_or_else(|| AdminError::BadRequest(format!("{field} is required")))
}

/// Generic outcome body used by the agent write endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>, success: bool) -> Self {
        Self {
            message: message.into(),
            success,
        }
    }
}

// ==================== Agents ====================

/// Request to create an agent.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAgentRequest {
    pub email: String,
    pub role: AgentRole,
    #[serde(default)]
    pub agency_id: Option<Uuid>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
}

impl CreateAgentRequest {
    /// Validate and normalize into repository input.
    pub fn into_new_agent(self) -> AdminResult<NewAgent> {
        Ok(NewAgent {
            agency_id: self.agency_id,
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            telephone: non_blank(self.telephone),
            ..NewAgent::new(required_text("email", self.email)?, self.role)
        })
    }
}

/// Request to update an agent. Only the keys present in the body are
/// written; `null` clears an optional field.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAgentRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<AgentRole>)]
    pub role: Option<Option<AgentRole>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub agency_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, nullable)]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, nullable)]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, nullable)]
    pub telephone: Option<Option<String>>,
}

impl UpdateAgentRequest {
    /// Validate and normalize into a patch. Blank text clears the field.
    pub fn into_patch(self) -> AdminResult<AgentPatch> {
        let email = match self.email {
            None => None,
            Some(None) => return Err(AdminError::BadRequest("email cannot be null".to_string())),
            Some(Some(email)) => Some(required_text("email", email)?),
        };

        let role = match self.role {
            None => None,
            Some(None) => return Err(AdminError::BadRequest("role cannot be null".to_string())),
            Some(role) => role,
        };

        Ok(AgentPatch {
            email,
            role,
            agency_id: self.agency_id,
            first_name: self.first_name.map(non_blank),
            last_name: self.last_name.map(non_blank),
            telephone: self.telephone.map(non_blank),
        })
    }
}

/// Response for listing agents.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListAgentsResponse {
    pub agents: Vec<Agent>,
}

/// Response for a single agent.
#[derive(Debug, Serialize, ToSchema)]
pub struct AgentResponse {
    pub agent: Agent,
}

// ==================== Agencies ====================

/// Request to create an agency.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAgencyRequest {
    pub name: String,
    pub code: String,
}

impl CreateAgencyRequest {
    pub fn into_agency(self) -> AdminResult<Agency> {
        Ok(Agency::new(
            required_text("name", self.name)?,
            required_text("code", self.code)?,
        ))
    }
}

/// Response for listing agencies.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListAgenciesResponse {
    pub agencies: Vec<Agency>,
}

/// Response for a single agency.
#[derive(Debug, Serialize, ToSchema)]
pub struct AgencyResponse {
    pub agency: Agency,
}

// ==================== Customers ====================

/// Request to create a customer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Plan to subscribe the customer to.
    #[serde(default)]
    pub subscription_id: Option<i64>,
    /// Status of that subscription; defaults to `active`.
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
}

impl CreateCustomerRequest {
    pub fn into_new_customer(self) -> AdminResult<NewCustomer> {
        if self.subscription_id.is_none() && self.status.is_some() {
            return Err(AdminError::BadRequest(
                "status requires subscription_id".to_string(),
            ));
        }

        Ok(NewCustomer {
            name: required_text("name", self.name)?,
            email: required_text("email", self.email)?,
            notes: non_blank(self.notes),
            subscription: self
                .subscription_id
                .map(|id| (id, self.status.unwrap_or_default())),
        })
    }
}

/// Response for listing customers.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomersResponse {
    pub customers: Vec<Customer>,
}

/// Response for a single customer.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub customer: Customer,
}

/// Response for listing customer/plan links.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomerSubscriptionsResponse {
    pub customer_subscriptions: Vec<SubscriptionLink>,
}

// ==================== Subscriptions ====================

/// Request to create a subscription plan.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in minor currency units.
    #[serde(default)]
    pub price: i64,
}

impl CreateSubscriptionRequest {
    pub fn into_new_subscription(self) -> AdminResult<NewSubscription> {
        if self.price < 0 {
            return Err(AdminError::BadRequest("price cannot be negative".to_string()));
        }

        Ok(NewSubscription {
            name: required_text("name", self.name)?,
            description: non_blank(self.description),
            price: self.price,
        })
    }
}

/// Response for listing subscription plans.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListSubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
}

/// Response for a single subscription plan.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub subscription: Subscription,
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
    /// Timestamp.
    pub timestamp: String,
}
