//! Agency domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An agency that agents can belong to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Agency {
    /// Unique identifier.
    pub id: Uuid,
    /// Agency name.
    pub name: String,
    /// Short code used by the incentive programme.
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agency {
    /// Create a new agency.
    pub fn new(name: String, code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            code,
            created_at: now,
            updated_at: now,
        }
    }
}
