//! Customer and subscription persistence.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::domain::{Customer, NewCustomer, NewSubscription, Subscription, SubscriptionLink};
use crate::error::AdminResult;
use crate::storage::models::{
    parse_timestamp, CustomerRow, SubscriptionLinkRow, SubscriptionRow,
};
use crate::storage::schema::format_timestamp;

const SELECT_CUSTOMERS: &str = r#"
    SELECT
        c.id,
        c.name,
        c.email,
        c.notes,
        c.created_at,
        c.updated_at,
        cs.id AS link_id,
        cs.status AS link_status,
        s.id AS subscription_id,
        s.name AS subscription_name,
        s.description AS subscription_description,
        s.price AS subscription_price
    FROM customers c
    LEFT JOIN customer_subscriptions cs ON c.id = cs.customer_id
    LEFT JOIN subscriptions s ON cs.subscription_id = s.id
"#;

/// Fold join rows into customers. Rows for one customer must be adjacent.
fn group_customers(rows: Vec<CustomerRow>) -> AdminResult<Vec<Customer>> {
    let mut customers: Vec<Customer> = Vec::new();

    for row in rows {
        let subscription = row.subscription()?;

        if let Some(current) = customers.last_mut().filter(|c| c.id == row.id) {
            current.subscriptions.extend(subscription);
            continue;
        }

        customers.push(Customer {
            id: row.id,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            name: row.name,
            email: row.email,
            notes: row.notes,
            subscriptions: subscription.into_iter().collect(),
        });
    }

    Ok(customers)
}

/// Repository for customers.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All customers with their subscriptions, newest first.
    pub async fn list(&self) -> AdminResult<Vec<Customer>> {
        let query = format!("{SELECT_CUSTOMERS} ORDER BY c.id DESC, cs.id ASC");
        let rows: Vec<CustomerRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;

        group_customers(rows)
    }

    /// Get a customer by ID.
    pub async fn get_by_id(&self, id: i64) -> AdminResult<Option<Customer>> {
        let query = format!("{SELECT_CUSTOMERS} WHERE c.id = ? ORDER BY cs.id ASC");
        let rows: Vec<CustomerRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(group_customers(rows)?.into_iter().next())
    }

    /// Every customer/plan link, in insertion order.
    pub async fn list_subscription_links(&self) -> AdminResult<Vec<SubscriptionLink>> {
        let rows: Vec<SubscriptionLinkRow> = sqlx::query_as(
            "SELECT id, customer_id, subscription_id, status, created_at FROM customer_subscriptions ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Insert a customer and, if requested, link them to a plan.
    ///
    /// The two inserts are independent statements: if linking fails the
    /// customer row stays and the error is returned.
    pub async fn create(&self, customer: &NewCustomer) -> AdminResult<i64> {
        let now = format_timestamp(Utc::now());

        let id = sqlx::query(
            r#"
            INSERT INTO customers (name, email, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.notes)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        if let Some((subscription_id, status)) = customer.subscription {
            sqlx::query(
                r#"
                INSERT INTO customer_subscriptions (customer_id, subscription_id, status, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(subscription_id)
            .bind(status.to_string())
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        tracing::info!(customer_id = id, "Customer created");
        Ok(id)
    }
}

/// Repository for subscription plans.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All plans, alphabetically.
    pub async fn list(&self) -> AdminResult<Vec<Subscription>> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            "SELECT id, name, description, price, created_at, updated_at FROM subscriptions ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Get a plan by ID.
    pub async fn get_by_id(&self, id: i64) -> AdminResult<Option<Subscription>> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            "SELECT id, name, description, price, created_at, updated_at FROM subscriptions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Create a plan and return its ID.
    pub async fn create(&self, subscription: &NewSubscription) -> AdminResult<i64> {
        let now = format_timestamp(Utc::now());

        let id = sqlx::query(
            r#"
            INSERT INTO subscriptions (name, description, price, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subscription.name)
        .bind(&subscription.description)
        .bind(subscription.price)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(subscription_id = id, "Subscription created");
        Ok(id)
    }
}
