//! PostgreSQL implementation of DeliveryLog.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::outbound::OutboundDelivery;
use crate::ports::DeliveryLog;

pub struct PostgresDeliveryLog {
    pool: PgPool,
}

impl PostgresDeliveryLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLog for PostgresDeliveryLog {
    async fn record(&self, delivery: &OutboundDelivery) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO outbound_deliveries (
                id, event_id, target_id, attempt, status, response_code,
                response_body, next_retry_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(delivery.id.as_uuid())
        .bind(delivery.event_id.as_uuid())
        .bind(delivery.target_id.as_uuid())
        .bind(delivery.attempt)
        .bind(delivery.status.as_str())
        .bind(delivery.response_code)
        .bind(&delivery.response_body)
        .bind(delivery.next_retry_at.map(|t| t.into_datetime()))
        .bind(delivery.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record delivery: {}", e)))?;

        Ok(())
    }
}
