//! PostgreSQL implementation of EventBusRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{BusEventId, DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::outbound::{BusEventStatus, EventBusEntry};
use crate::ports::EventBusRepository;

pub struct PostgresEventBusRepository {
    pool: PgPool,
}

impl PostgresEventBusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventBusRow {
    id: Uuid,
    event_type: String,
    user_id: Option<Uuid>,
    subscription_id: Option<Uuid>,
    data: Value,
    status: String,
    retry_count: i32,
    created_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
}

impl TryFrom<EventBusRow> for EventBusEntry {
    type Error = DomainError;

    fn try_from(row: EventBusRow) -> Result<Self, Self::Error> {
        let status: BusEventStatus = row.status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status: {}", e))
        })?;

        Ok(EventBusEntry {
            id: BusEventId::from_uuid(row.id),
            event_type: row.event_type,
            user_id: row.user_id.map(UserId::from_uuid),
            subscription_id: row.subscription_id,
            data: row.data,
            status,
            retry_count: row.retry_count,
            created_at: Timestamp::from_datetime(row.created_at),
            dispatched_at: row.dispatched_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl EventBusRepository for PostgresEventBusRepository {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<EventBusEntry>, DomainError> {
        let rows: Vec<EventBusRow> = sqlx::query_as(
            r#"
            SELECT id, event_type, user_id, subscription_id, data, status,
                   retry_count, created_at, dispatched_at
            FROM event_bus
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch pending events: {}", e)))?;

        rows.into_iter().map(EventBusEntry::try_from).collect()
    }

    async fn mark_dispatched(&self, id: &BusEventId, at: Timestamp) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE event_bus
            SET status = 'dispatched', dispatched_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark event dispatched: {}", e)))?;

        Ok(())
    }
}
