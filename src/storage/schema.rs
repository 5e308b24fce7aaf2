//! Table definitions, created idempotently at start-up.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;

use crate::error::AdminResult;

/// Render a timestamp for storage.
///
/// Fixed-width microsecond precision, so text ordering matches time ordering.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Initialize the database schema.
pub async fn init_schema(pool: &SqlitePool) -> AdminResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agencies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_agencies_name ON agencies(name);
        "#,
    )
    .execute(pool)
    .await?;

    // agency_id is not a foreign key and may dangle once its agency is deleted.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agents (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL CHECK (role IN ('agent', 'hotel_admin', 'regional_admin', 'global_admin')),
            agency_id TEXT,
            first_name TEXT,
            last_name TEXT,
            telephone TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_agents_agency_id ON agents(agency_id);
        CREATE INDEX IF NOT EXISTS idx_agents_created_at ON agents(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            price INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_customers_email ON customers(email);
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customer_subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            subscription_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE,
            FOREIGN KEY (subscription_id) REFERENCES subscriptions(id)
        );

        CREATE INDEX IF NOT EXISTS idx_customer_subscriptions_customer
            ON customer_subscriptions(customer_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-01T00:00:00.9Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(format_timestamp(later), "2024-01-01T00:00:01.000000Z");
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = crate::storage::test_pool().await;
        init_schema(&pool).await.unwrap();
    }
}
