//! Database models.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    Agency, AgencyRef, Agent, CustomerSubscription, Subscription, SubscriptionLink,
    SubscriptionStatus,
};
use crate::error::AdminError;

fn parse_uuid(value: &str) -> Result<Uuid, AdminError> {
    Uuid::parse_str(value).map_err(|e| AdminError::Internal(e.to_string()))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AdminError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AdminError::Internal(e.to_string()))
}

/// Denormalized row of `agents LEFT JOIN agencies`.
#[derive(Debug, Clone, FromRow)]
pub struct AgentRow {
    pub id: String,
    pub email: String,
    pub role: String,
    pub agency_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub telephone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub agency_name: Option<String>,
    pub agency_code: Option<String>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = AdminError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        let agency_id = row.agency_id.as_deref().map(parse_uuid).transpose()?;

        // The join matched only if the agency's name came back.
        let agency = match (agency_id, row.agency_name) {
            (Some(id), Some(name)) => Some(AgencyRef {
                id,
                name,
                code: row.agency_code.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Agent {
            id: parse_uuid(&row.id)?,
            email: row.email,
            role: row.role.parse().map_err(AdminError::Internal)?,
            agency_id,
            first_name: row.first_name,
            last_name: row.last_name,
            telephone: row.telephone,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            agency,
        })
    }
}

/// Database row for agencies table.
#[derive(Debug, Clone, FromRow)]
pub struct AgencyRow {
    pub id: String,
    pub name: String,
    pub code: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<AgencyRow> for Agency {
    type Error = AdminError;

    fn try_from(row: AgencyRow) -> Result<Self, Self::Error> {
        Ok(Agency {
            id: parse_uuid(&row.id)?,
            name: row.name,
            code: row.code,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Database row for subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = AdminError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Row of `customer_subscriptions`.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionLinkRow {
    pub id: i64,
    pub customer_id: i64,
    pub subscription_id: i64,
    pub status: String,
    pub created_at: String,
}

impl TryFrom<SubscriptionLinkRow> for SubscriptionLink {
    type Error = AdminError;

    fn try_from(row: SubscriptionLinkRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionLink {
            id: row.id,
            customer_id: row.customer_id,
            subscription_id: row.subscription_id,
            status: row.status.parse().map_err(AdminError::Internal)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Denormalized row of `customers LEFT JOIN customer_subscriptions LEFT JOIN
/// subscriptions`. One row per link, or a single row with null link columns.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub link_id: Option<i64>,
    pub link_status: Option<String>,
    pub subscription_id: Option<i64>,
    pub subscription_name: Option<String>,
    pub subscription_description: Option<String>,
    pub subscription_price: Option<i64>,
}

impl CustomerRow {
    /// The linked plan, when both join steps matched.
    pub fn subscription(&self) -> Result<Option<CustomerSubscription>, AdminError> {
        let (Some(id), Some(subscription_id), Some(name)) =
            (self.link_id, self.subscription_id, self.subscription_name.clone())
        else {
            return Ok(None);
        };

        let status = self
            .link_status
            .as_deref()
            .map(str::parse::<SubscriptionStatus>)
            .transpose()
            .map_err(AdminError::Internal)?
            .unwrap_or_default();

        Ok(Some(CustomerSubscription {
            id,
            subscription_id,
            status,
            name,
            description: self.subscription_description.clone(),
            price: self.subscription_price.unwrap_or_default(),
        }))
    }
}
