//! Agency persistence.

use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::Agency;
use crate::error::AdminResult;
use crate::storage::models::AgencyRow;
use crate::storage::schema::format_timestamp;

/// Repository for agencies.
#[derive(Clone)]
pub struct AgencyRepository {
    pool: SqlitePool,
}

impl AgencyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All agencies, alphabetically.
    pub async fn list(&self) -> AdminResult<Vec<Agency>> {
        let rows: Vec<AgencyRow> = sqlx::query_as(
            "SELECT id, name, code, created_at, updated_at FROM agencies ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Get an agency by ID.
    pub async fn get_by_id(&self, id: Uuid) -> AdminResult<Option<Agency>> {
        let row: Option<AgencyRow> = sqlx::query_as(
            "SELECT id, name, code, created_at, updated_at FROM agencies WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Create a new agency.
    pub async fn create(&self, agency: &Agency) -> AdminResult<()> {
        sqlx::query(
            r#"
            INSERT INTO agencies (id, name, code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(agency.id.to_string())
        .bind(&agency.name)
        .bind(&agency.code)
        .bind(format_timestamp(agency.created_at))
        .bind(format_timestamp(agency.updated_at))
        .execute(&self.pool)
        .await?;

        tracing::info!(agency_id = %agency.id, code = %agency.code, "Agency created");
        Ok(())
    }

    /// Delete an agency. Agents pointing at it keep their dangling reference.
    pub async fn delete(&self, id: Uuid) -> AdminResult<()> {
        let result = sqlx::query("DELETE FROM agencies WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::info!(agency_id = %id, rows = result.rows_affected(), "Agency deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    #[tokio::test]
    async fn test_agency_lifecycle() {
        let repo = AgencyRepository::new(test_pool().await);

        let zeta = Agency::new("Zeta Tours".to_string(), "ZET".to_string());
        let alpha = Agency::new("Alpha Holidays".to_string(), "ALP".to_string());
        repo.create(&zeta).await.unwrap();
        repo.create(&alpha).await.unwrap();

        let names: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Alpha Holidays", "Zeta Tours"]);

        let fetched = repo.get_by_id(zeta.id).await.unwrap().unwrap();
        assert_eq!(fetched.code, "ZET");
        assert_eq!(fetched.created_at, fetched.updated_at);

        repo.delete(zeta.id).await.unwrap();
        assert!(repo.get_by_id(zeta.id).await.unwrap().is_none());

        // Deleting again is fine.
        repo.delete(zeta.id).await.unwrap();
    }
}
