//! PostgreSQL implementation of WebhookEventStore.
//!
//! The `idempotency_key` column carries a UNIQUE constraint; the insert uses
//! `ON CONFLICT DO NOTHING` so a concurrent duplicate surfaces as
//! `SaveResult::AlreadyExists` instead of an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, WebhookEventId};
use crate::domain::webhook::{IdempotencyKey, Provider, WebhookEvent, WebhookEventStatus};
use crate::ports::{SaveResult, WebhookEventStore};

pub struct PostgresWebhookEventStore {
    pool: PgPool,
}

impl PostgresWebhookEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    id: Uuid,
    provider: String,
    raw_headers: Value,
    raw_payload: Value,
    idempotency_key: String,
    verified: bool,
    status: String,
    canonical_event: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WebhookEventRow> for WebhookEvent {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let provider: Provider = row.provider.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider: {}", e))
        })?;
        let status: WebhookEventStatus = row.status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status: {}", e))
        })?;

        Ok(WebhookEvent {
            id: WebhookEventId::from_uuid(row.id),
            provider,
            raw_headers: row.raw_headers,
            raw_payload: row.raw_payload,
            idempotency_key: IdempotencyKey::from_stored(row.idempotency_key),
            verified: row.verified,
            status,
            canonical_event: row.canonical_event,
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl WebhookEventStore for PostgresWebhookEventStore {
    async fn insert(&self, event: &WebhookEvent) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id, provider, raw_headers, raw_payload, idempotency_key,
                verified, status, canonical_event, processed_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.provider.as_str())
        .bind(&event.raw_headers)
        .bind(&event.raw_payload)
        .bind(event.idempotency_key.as_str())
        .bind(event.verified)
        .bind(event.status.as_str())
        .bind(&event.canonical_event)
        .bind(event.processed_at.map(|t| t.into_datetime()))
        .bind(event.created_at.as_datetime())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(SaveResult::AlreadyExists),
            Ok(_) => Ok(SaveResult::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(SaveResult::AlreadyExists)
            }
            Err(e) => Err(DomainError::database(format!(
                "Failed to insert webhook event: {}",
                e
            ))),
        }
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT id, provider, raw_headers, raw_payload, idempotency_key,
                   verified, status, canonical_event, processed_at, created_at
            FROM webhook_events
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find webhook event: {}", e)))?;

        row.map(WebhookEvent::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::postgres::schema;
    use serde_json::json;

    const ALL_STATUSES: [WebhookEventStatus; 4] = [
        WebhookEventStatus::Received,
        WebhookEventStatus::Processed,
        WebhookEventStatus::Failed,
        WebhookEventStatus::Discarded,
    ];

    fn row(status: &str) -> WebhookEventRow {
        WebhookEventRow {
            id: Uuid::new_v4(),
            provider: "kiwify".to_string(),
            raw_headers: json!({}),
            raw_payload: json!({"order_id": "o-1"}),
            idempotency_key: "kiwify:o-1".to_string(),
            verified: true,
            status: status.to_string(),
            canonical_event: None,
            processed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn schema_accepts_every_event_status() {
        let allowed = schema::allowed_values("webhook_events", "status");
        for status in ALL_STATUSES {
            assert!(
                allowed.iter().any(|v| v == status.as_str()),
                "webhook_events.status rejects '{}'",
                status
            );
        }
        assert_eq!(allowed.len(), ALL_STATUSES.len());
    }

    #[test]
    fn schema_accepts_every_provider() {
        let allowed = schema::allowed_values("webhook_endpoints", "provider");
        for provider in Provider::ALL {
            assert!(allowed.iter().any(|v| v == provider.as_str()));
        }
    }

    #[test]
    fn row_conversion_works_for_all_statuses() {
        for status in ALL_STATUSES {
            let event = WebhookEvent::try_from(row(status.as_str())).unwrap();
            assert_eq!(event.status, status);
            assert_eq!(event.provider, Provider::Kiwify);
        }
    }

    #[test]
    fn row_with_unknown_status_is_a_database_error() {
        let err = WebhookEvent::try_from(row("archived")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
