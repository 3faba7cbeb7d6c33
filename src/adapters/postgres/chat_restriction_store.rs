//! PostgreSQL chat restriction reader and moderation writes.
//!
//! The global block lives in the `chat_settings` key/value table. Table
//! triggers announce every write on the change channel; nothing here publishes
//! directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::chat::{GlobalChatBlock, UserChatRestriction, GLOBAL_CHAT_BLOCK_KEY};
use crate::domain::foundation::{DomainError, ErrorCode, RestrictionId, Timestamp, UserId};
use crate::ports::{ChatModeration, ChatRestrictionReader};

pub struct PostgresChatRestrictionStore {
    pool: PgPool,
}

impl PostgresChatRestrictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RestrictionRow {
    id: Uuid,
    user_id: Uuid,
    reason: Option<String>,
    blocked_until: DateTime<Utc>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<RestrictionRow> for UserChatRestriction {
    fn from(row: RestrictionRow) -> Self {
        UserChatRestriction {
            id: RestrictionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            reason: row.reason,
            blocked_until: Timestamp::from_datetime(row.blocked_until),
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl ChatRestrictionReader for PostgresChatRestrictionStore {
    async fn global_block(&self) -> Result<Option<GlobalChatBlock>, DomainError> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT value FROM chat_settings WHERE key = $1")
                .bind(GLOBAL_CHAT_BLOCK_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to load chat settings: {}", e))
                })?;

        match row {
            None => Ok(None),
            Some((Value::Null,)) => Ok(None),
            Some((value,)) => serde_json::from_value(value).map(Some).map_err(|e| {
                DomainError::new(
                    ErrorCode::SerializationError,
                    format!("Malformed global chat block: {}", e),
                )
            }),
        }
    }

    async fn active_user_restriction(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<UserChatRestriction>, DomainError> {
        let row: Option<RestrictionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, reason, blocked_until, created_by, created_at
            FROM user_chat_restrictions
            WHERE user_id = $1 AND blocked_until > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load chat restriction: {}", e)))?;

        Ok(row.map(UserChatRestriction::from))
    }
}

#[async_trait]
impl ChatModeration for PostgresChatRestrictionStore {
    async fn add_restriction(&self, restriction: &UserChatRestriction) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_chat_restrictions (
                id, user_id, reason, blocked_until, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(restriction.id.as_uuid())
        .bind(restriction.user_id.as_uuid())
        .bind(&restriction.reason)
        .bind(restriction.blocked_until.as_datetime())
        .bind(restriction.created_by.map(|u| *u.as_uuid()))
        .bind(restriction.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save chat restriction: {}", e)))?;

        Ok(())
    }

    async fn set_global_block(&self, block: &GlobalChatBlock) -> Result<(), DomainError> {
        let value = serde_json::to_value(block).map_err(|e| {
            DomainError::new(ErrorCode::SerializationError, format!("Invalid block: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO chat_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(GLOBAL_CHAT_BLOCK_KEY)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to set global block: {}", e)))?;

        Ok(())
    }

    async fn clear_global_block(&self) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM chat_settings WHERE key = $1")
            .bind(GLOBAL_CHAT_BLOCK_KEY)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to clear global block: {}", e)))?;

        Ok(())
    }
}
