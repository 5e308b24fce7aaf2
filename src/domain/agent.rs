//! Agent domain models.
//!
//! Agents are the people administered by this service. Each agent may belong
//! to at most one agency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role of an agent. This is a closed set; anything else is rejected when a
/// request is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Agent,
    HotelAdmin,
    RegionalAdmin,
    GlobalAdmin,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Agent => "agent",
            AgentRole::HotelAdmin => "hotel_admin",
            AgentRole::RegionalAdmin => "regional_admin",
            AgentRole::GlobalAdmin => "global_admin",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(AgentRole::Agent),
            "hotel_admin" => Ok(AgentRole::HotelAdmin),
            "regional_admin" => Ok(AgentRole::RegionalAdmin),
            "global_admin" => Ok(AgentRole::GlobalAdmin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// The agency an agent belongs to, as embedded in agent responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AgencyRef {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

/// An agent, with its agency resolved when the reference is live.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Agent {
    /// Unique identifier.
    pub id: Uuid,
    pub email: String,
    pub role: AgentRole,
    /// Stored agency reference. May point at an agency that no longer exists.
    pub agency_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub telephone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Omitted entirely when the reference does not resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<AgencyRef>,
}

/// Fields supplied when creating an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    pub email: String,
    pub role: AgentRole,
    pub agency_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub telephone: Option<String>,
}

impl NewAgent {
    pub fn new(email: impl Into<String>, role: AgentRole) -> Self {
        Self {
            email: email.into(),
            role,
            agency_id: None,
            first_name: None,
            last_name: None,
            telephone: None,
        }
    }
}

/// A partial update to an agent.
///
/// For the nullable columns the outer `Option` is presence: `None` leaves the
/// column alone, `Some(None)` clears it and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentPatch {
    pub email: Option<String>,
    pub role: Option<AgentRole>,
    pub agency_id: Option<Option<Uuid>>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub telephone: Option<Option<String>>,
}

impl AgentPatch {
    /// True when no field was provided.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.role.is_none()
            && self.agency_id.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.telephone.is_none()
    }

    /// Column assignments in a fixed order, as bindable text values.
    pub fn assignments(&self) -> Vec<(&'static str, Option<String>)> {
        let mut columns = Vec::new();

        if let Some(email) = &self.email {
            columns.push(("email", Some(email.clone())));
        }
        if let Some(role) = self.role {
            columns.push(("role", Some(role.to_string())));
        }
        if let Some(agency_id) = self.agency_id {
            columns.push(("agency_id", agency_id.map(|id| id.to_string())));
        }
        if let Some(first_name) = &self.first_name {
            columns.push(("first_name", first_name.clone()));
        }
        if let Some(last_name) = &self.last_name {
            columns.push(("last_name", last_name.clone()));
        }
        if let Some(telephone) = &self.telephone {
            columns.push(("telephone", telephone.clone()));
        }

        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [
            AgentRole::Agent,
            AgentRole::HotelAdmin,
            AgentRole::RegionalAdmin,
            AgentRole::GlobalAdmin,
        ] {
            assert_eq!(role.to_string().parse::<AgentRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_rejects_unknown_values() {
        assert!("superuser".parse::<AgentRole>().is_err());
        assert!("Agent".parse::<AgentRole>().is_err());
        assert!(serde_json::from_str::<AgentRole>("\"owner\"").is_err());
        assert_eq!(
            serde_json::from_str::<AgentRole>("\"hotel_admin\"").unwrap(),
            AgentRole::HotelAdmin
        );
    }

    #[test]
    fn test_empty_patch() {
        assert!(AgentPatch::default().is_empty());
        assert!(AgentPatch::default().assignments().is_empty());
    }

    #[test]
    fn test_patch_distinguishes_clear_from_omitted() {
        let patch = AgentPatch {
            telephone: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.assignments(), vec![("telephone", None)]);
    }

    #[test]
    fn test_patch_assignment_order() {
        let agency = Uuid::new_v4();
        let patch = AgentPatch {
            telephone: Some(Some("555".to_string())),
            role: Some(AgentRole::GlobalAdmin),
            agency_id: Some(Some(agency)),
            ..Default::default()
        };
        let columns: Vec<_> = patch.assignments().into_iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["role", "agency_id", "telephone"]);
    }

    #[test]
    fn test_agency_is_omitted_when_absent() {
        let now = Utc::now();
        let agent = Agent {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            role: AgentRole::Agent,
            agency_id: None,
            first_name: None,
            last_name: None,
            telephone: None,
            created_at: now,
            updated_at: now,
            agency: None,
        };
        let json = serde_json::to_value(&agent).unwrap();
        assert!(json.get("agency").is_none());
        assert!(json["telephone"].is_null());
    }
}
