//! PostgreSQL tracking configuration reader and audit log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp, TrackingConfigId};
use crate::domain::tracking::{TrackingConfig, TrackingEvent};
use crate::ports::{TrackingConfigReader, TrackingEventLog};

pub struct PostgresTrackingStore {
    pool: PgPool,
}

impl PostgresTrackingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrackingConfigRow {
    id: Uuid,
    pixel_id: String,
    access_token: String,
    test_event_code: Option<String>,
    server_side_enabled: bool,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<TrackingConfigRow> for TrackingConfig {
    fn from(row: TrackingConfigRow) -> Self {
        TrackingConfig {
            id: TrackingConfigId::from_uuid(row.id),
            pixel_id: row.pixel_id,
            access_token: SecretString::new(row.access_token),
            test_event_code: row.test_event_code.filter(|c| !c.is_empty()),
            server_side_enabled: row.server_side_enabled,
            active: row.active,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl TrackingConfigReader for PostgresTrackingStore {
    async fn active_config(&self) -> Result<Option<TrackingConfig>, DomainError> {
        let row: Option<TrackingConfigRow> = sqlx::query_as(
            r#"
            SELECT id, pixel_id, access_token, test_event_code,
                   server_side_enabled, active, created_at
            FROM tracking_configs
            WHERE active = TRUE AND server_side_enabled = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load tracking config: {}", e)))?;

        Ok(row.map(TrackingConfig::from))
    }
}

#[async_trait]
impl TrackingEventLog for PostgresTrackingStore {
    async fn record(&self, event: &TrackingEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tracking_events (
                id, event_name, event_id, payload, success, response,
                error_message, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(&event.event_name)
        .bind(&event.event_id)
        .bind(&event.payload)
        .bind(event.success)
        .bind(&event.response)
        .bind(&event.error_message)
        .bind(event.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record tracking event: {}", e)))?;

        Ok(())
    }
}
