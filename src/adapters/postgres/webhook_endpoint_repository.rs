//! PostgreSQL implementation of WebhookEndpointRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, WebhookEndpointId};
use crate::domain::webhook::{Provider, WebhookEndpoint};
use crate::ports::WebhookEndpointRepository;

pub struct PostgresWebhookEndpointRepository {
    pool: PgPool,
}

impl PostgresWebhookEndpointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEndpointRow {
    id: Uuid,
    provider: String,
    url: String,
    secret: String,
    active: bool,
    require_signature: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<WebhookEndpointRow> for WebhookEndpoint {
    type Error = DomainError;

    fn try_from(row: WebhookEndpointRow) -> Result<Self, Self::Error> {
        let provider: Provider = row.provider.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider: {}", e))
        })?;

        Ok(WebhookEndpoint {
            id: WebhookEndpointId::from_uuid(row.id),
            provider,
            url: row.url,
            secret: SecretString::new(row.secret),
            active: row.active,
            require_signature: row.require_signature,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl WebhookEndpointRepository for PostgresWebhookEndpointRepository {
    async fn find_active(&self, provider: Provider) -> Result<Option<WebhookEndpoint>, DomainError> {
        let row: Option<WebhookEndpointRow> = sqlx::query_as(
            r#"
            SELECT id, provider, url, secret, active, require_signature, created_at
            FROM webhook_endpoints
            WHERE provider = $1 AND active = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load webhook endpoint: {}", e)))?;

        row.map(WebhookEndpoint::try_from).transpose()
    }

    async fn save(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_endpoints (
                id, provider, url, secret, active, require_signature, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(endpoint.id.as_uuid())
        .bind(endpoint.provider.as_str())
        .bind(&endpoint.url)
        .bind(endpoint.secret.expose_secret())
        .bind(endpoint.active)
        .bind(endpoint.require_signature)
        .bind(endpoint.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save webhook endpoint: {}", e)))?;

        Ok(())
    }

    async fn deactivate(&self, id: &WebhookEndpointId) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE webhook_endpoints SET active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to deactivate webhook endpoint: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::EndpointNotFound,
                format!("Endpoint {} not found", id),
            ));
        }
        Ok(())
    }
}
