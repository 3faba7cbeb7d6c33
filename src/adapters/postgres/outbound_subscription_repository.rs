//! PostgreSQL implementation of OutboundSubscriptionRepository.
//!
//! Failure counters are incremented in SQL so concurrent dispatch runs never
//! lose an update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgQueryResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OutboundSubscriptionId, Timestamp};
use crate::domain::outbound::OutboundSubscription;
use crate::ports::OutboundSubscriptionRepository;

pub struct PostgresOutboundSubscriptionRepository {
    pool: PgPool,
}

impl PostgresOutboundSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    name: String,
    target_url: String,
    secret: Option<String>,
    active: bool,
    failures_count: i32,
    last_delivery_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for OutboundSubscription {
    fn from(row: SubscriptionRow) -> Self {
        OutboundSubscription {
            id: OutboundSubscriptionId::from_uuid(row.id),
            name: row.name,
            target_url: row.target_url,
            secret: row.secret.filter(|s| !s.is_empty()).map(SecretString::new),
            active: row.active,
            failures_count: row.failures_count,
            last_delivery_at: row.last_delivery_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

fn require_row(result: PgQueryResult, id: &OutboundSubscriptionId) -> Result<(), DomainError> {
    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::SubscriptionNotFound,
            format!("Subscription {} not found", id),
        ));
    }
    Ok(())
}

#[async_trait]
impl OutboundSubscriptionRepository for PostgresOutboundSubscriptionRepository {
    async fn list_active(&self) -> Result<Vec<OutboundSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, name, target_url, secret, active, failures_count,
                   last_delivery_at, created_at
            FROM outbound_subscriptions
            WHERE active = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list subscriptions: {}", e)))?;

        Ok(rows.into_iter().map(OutboundSubscription::from).collect())
    }

    async fn save(&self, subscription: &OutboundSubscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO outbound_subscriptions (
                id, name, target_url, secret, active, failures_count,
                last_delivery_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(&subscription.name)
        .bind(&subscription.target_url)
        .bind(subscription.secret.as_ref().map(|s| s.expose_secret().clone()))
        .bind(subscription.active)
        .bind(subscription.failures_count)
        .bind(subscription.last_delivery_at.map(|t| t.into_datetime()))
        .bind(subscription.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save subscription: {}", e)))?;

        Ok(())
    }

    async fn record_success(
        &self,
        id: &OutboundSubscriptionId,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE outbound_subscriptions SET failures_count = 0, last_delivery_at = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record delivery: {}", e)))?;

        require_row(result, id)
    }

    async fn record_failure(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE outbound_subscriptions SET failures_count = failures_count + 1 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record failure: {}", e)))?;

        require_row(result, id)
    }

    async fn deactivate(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE outbound_subscriptions SET active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to deactivate subscription: {}", e))
            })?;

        require_row(result, id)
    }
}
