//! ModerateChatHandler - Staff actions on chat access.
//!
//! Only admins and moderators may moderate. Writes reach live watchers
//! through the change feed, not through this handler.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::chat::{GlobalChatBlock, UserChatRestriction};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{ChatModeration, RoleLookup};

#[derive(Debug, Clone, Deserialize)]
pub struct RestrictUserCommand {
    pub user_id: UserId,
    #[serde(default)]
    pub reason: Option<String>,
    pub blocked_until: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetGlobalBlockCommand {
    #[serde(default)]
    pub reason: Option<String>,
    pub blocked_until: Timestamp,
}

pub struct ModerateChatHandler {
    roles: Arc<dyn RoleLookup>,
    moderation: Arc<dyn ChatModeration>,
}

impl ModerateChatHandler {
    pub fn new(roles: Arc<dyn RoleLookup>, moderation: Arc<dyn ChatModeration>) -> Self {
        Self { roles, moderation }
    }

    pub async fn restrict_user(
        &self,
        moderator: &UserId,
        cmd: RestrictUserCommand,
    ) -> Result<UserChatRestriction, DomainError> {
        self.require_staff(moderator).await?;

        let restriction =
            UserChatRestriction::new(cmd.user_id, cmd.reason, cmd.blocked_until, Some(*moderator))?;
        self.moderation.add_restriction(&restriction).await?;

        tracing::info!(
            user_id = %restriction.user_id,
            moderator = %moderator,
            blocked_until = %restriction.blocked_until,
            "User restricted from chat"
        );
        Ok(restriction)
    }

    pub async fn set_global_block(
        &self,
        moderator: &UserId,
        cmd: SetGlobalBlockCommand,
    ) -> Result<(), DomainError> {
        self.require_staff(moderator).await?;

        let block = GlobalChatBlock::new(cmd.reason, cmd.blocked_until)?;
        self.moderation.set_global_block(&block).await?;

        tracing::info!(moderator = %moderator, blocked_until = %cmd.blocked_until, "Global chat block set");
        Ok(())
    }

    pub async fn clear_global_block(&self, moderator: &UserId) -> Result<(), DomainError> {
        self.require_staff(moderator).await?;
        self.moderation.clear_global_block().await?;
        tracing::info!(moderator = %moderator, "Global chat block cleared");
        Ok(())
    }

    async fn require_staff(&self, user_id: &UserId) -> Result<(), DomainError> {
        let role = self.roles.get_user_role(user_id).await?;
        if !role.is_staff() {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins and moderators can moderate chat",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryChatStore, InMemoryRoles};
    use crate::domain::chat::MAX_REASON_CHARS;
    use crate::domain::foundation::UserRole;
    use crate::ports::ChatRestrictionReader;

    fn setup(role: UserRole) -> (UserId, Arc<InMemoryChatStore>, ModerateChatHandler) {
        let moderator = UserId::new();
        let roles = Arc::new(InMemoryRoles::new().with_role(moderator, role));
        let store = Arc::new(InMemoryChatStore::new());
        (moderator, store.clone(), ModerateChatHandler::new(roles, store))
    }

    #[tokio::test]
    async fn moderator_can_restrict_a_user() {
        let (moderator, store, handler) = setup(UserRole::Moderator);
        let target = UserId::new();

        let restriction = handler
            .restrict_user(
                &moderator,
                RestrictUserCommand {
                    user_id: target,
                    reason: Some("flooding".into()),
                    blocked_until: Timestamp::now().plus_secs(600),
                },
            )
            .await
            .unwrap();

        assert_eq!(restriction.created_by, Some(moderator));
        assert_eq!(store.restrictions().await.len(), 1);
    }

    #[tokio::test]
    async fn plain_user_cannot_moderate() {
        let (user, store, handler) = setup(UserRole::User);

        let err = handler.clear_global_block(&user).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(store.global_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn global_block_round_trip() {
        let (admin, store, handler) = setup(UserRole::Admin);

        handler
            .set_global_block(
                &admin,
                SetGlobalBlockCommand {
                    reason: Some("live".into()),
                    blocked_until: Timestamp::now().plus_secs(60),
                },
            )
            .await
            .unwrap();
        assert!(store.global_block().await.unwrap().is_some());

        handler.clear_global_block(&admin).await.unwrap();
        assert!(store.global_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn past_end_time_is_rejected() {
        let (admin, _, handler) = setup(UserRole::Admin);

        let err = handler
            .set_global_block(
                &admin,
                SetGlobalBlockCommand {
                    reason: None,
                    blocked_until: Timestamp::now().plus_secs(-60),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn oversized_reason_is_rejected_before_writing() {
        let (admin, store, handler) = setup(UserRole::Admin);
        let reason = Some("x".repeat(MAX_REASON_CHARS + 1));

        let err = handler
            .restrict_user(
                &admin,
                RestrictUserCommand {
                    user_id: UserId::new(),
                    reason: reason.clone(),
                    blocked_until: Timestamp::now().plus_secs(60),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = handler
            .set_global_block(
                &admin,
                SetGlobalBlockCommand {
                    reason,
                    blocked_until: Timestamp::now().plus_secs(60),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        assert!(store.restrictions().await.is_empty());
        assert!(store.global_block().await.unwrap().is_none());
    }
}
