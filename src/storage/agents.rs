//! Agent persistence.
//!
//! Reads join each agent to its agency and rebuild the nested relation.
//! Writes never raise: they log the failure and report `false`, so handlers
//! only branch on a flag.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::{Agent, AgentPatch, NewAgent};
use crate::error::AdminResult;
use crate::storage::models::AgentRow;
use crate::storage::schema::format_timestamp;

const SELECT_AGENTS: &str = r#"
    SELECT
        a.id,
        a.email,
        a.role,
        a.agency_id,
        a.first_name,
        a.last_name,
        a.telephone,
        a.created_at,
        a.updated_at,
        ag.name AS agency_name,
        ag.code AS agency_code
    FROM agents a
    LEFT JOIN agencies ag ON a.agency_id = ag.id
"#;

const INSERT_AGENT: &str = r#"
    INSERT INTO agents (
        id, email, role, agency_id, first_name, last_name, telephone, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Build `UPDATE agents SET c1 = ?, c2 = ?, updated_at = ? WHERE id = ?`.
///
/// Column names come from [`AgentPatch::assignments`], never from input.
fn update_statement(columns: &[&str]) -> String {
    let mut sql = String::from("UPDATE agents SET ");
    for column in columns {
        sql.push_str(column);
        sql.push_str(" = ?, ");
    }
    sql.push_str("updated_at = ? WHERE id = ?");
    sql
}

/// Repository for agents.
#[derive(Clone)]
pub struct AgentRepository {
    pool: SqlitePool,
}

impl AgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All agents, newest first.
    pub async fn list(&self) -> AdminResult<Vec<Agent>> {
        let query = format!("{SELECT_AGENTS} ORDER BY a.created_at DESC, a.rowid DESC");
        let rows: Vec<AgentRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// One agent, or `None` if no agent has this id.
    pub async fn get_by_id(&self, id: Uuid) -> AdminResult<Option<Agent>> {
        let query = format!("{SELECT_AGENTS} WHERE a.id = ?");
        let row: Option<AgentRow> = sqlx::query_as(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Insert a new agent with a fresh id.
    pub async fn create(&self, agent: &NewAgent) -> bool {
        let id = Uuid::new_v4();
        let now = format_timestamp(Utc::now());

        let result = sqlx::query(INSERT_AGENT)
            .bind(id.to_string())
            .bind(&agent.email)
            .bind(agent.role.to_string())
            .bind(agent.agency_id.map(|id| id.to_string()))
            .bind(&agent.first_name)
            .bind(&agent.last_name)
            .bind(&agent.telephone)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                tracing::info!(agent_id = %id, role = %agent.role, "Agent created");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error creating agent");
                false
            }
        }
    }

    /// Write only the fields present in `patch`, plus `updated_at`.
    ///
    /// An empty patch is a no-op that reports `false` without a round-trip.
    pub async fn update(&self, id: Uuid, patch: &AgentPatch) -> bool {
        let assignments = patch.assignments();
        if assignments.is_empty() {
            tracing::debug!(agent_id = %id, "Agent update with no fields ignored");
            return false;
        }

        let columns: Vec<&str> = assignments.iter().map(|(column, _)| *column).collect();
        let sql = update_statement(&columns);

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = query.bind(value);
        }

        let result = query
            .bind(format_timestamp(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                tracing::info!(
                    agent_id = %id,
                    fields = ?columns,
                    rows = done.rows_affected(),
                    "Agent updated"
                );
                true
            }
            Err(e) => {
                tracing::error!(agent_id = %id, error = %e, "Error updating agent");
                false
            }
        }
    }

    /// Hard delete. Deleting an unknown id still succeeds.
    pub async fn delete(&self, id: Uuid) -> bool {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                tracing::info!(agent_id = %id, rows = done.rows_affected(), "Agent deleted");
                true
            }
            Err(e) => {
                tracing::error!(agent_id = %id, error = %e, "Error deleting agent");
                false
            }
        }
    }
}
