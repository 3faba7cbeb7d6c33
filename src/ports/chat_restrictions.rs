//! Chat restriction ports.
//!
//! Reads feed the restriction resolver; writes come from moderators. Both
//! sides share the same two tables, and writes are announced to subscribers
//! through the realtime change feed.

use async_trait::async_trait;

use crate::domain::chat::{GlobalChatBlock, UserChatRestriction};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

#[async_trait]
pub trait ChatRestrictionReader: Send + Sync {
    /// The global chat block setting, if one was ever set.
    async fn global_block(&self) -> Result<Option<GlobalChatBlock>, DomainError>;

    /// The most recently created restriction of `user_id` still in force at `now`.
    async fn active_user_restriction(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<UserChatRestriction>, DomainError>;
}

#[async_trait]
pub trait ChatModeration: Send + Sync {
    async fn add_restriction(&self, restriction: &UserChatRestriction) -> Result<(), DomainError>;

    async fn set_global_block(&self, block: &GlobalChatBlock) -> Result<(), DomainError>;

    async fn clear_global_block(&self) -> Result<(), DomainError>;
}
