//! In-memory chat restriction store.
//!
//! Mimics the database triggers: every write is announced on the attached
//! [`ChangeFeed`], so watchers see the same notifications they would get from
//! Postgres.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapters::realtime::{ChangeFeed, ChangeTopic, ChangeType, RowChange};
use crate::domain::chat::{GlobalChatBlock, UserChatRestriction};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{ChatModeration, ChatRestrictionReader};

#[derive(Default)]
pub struct InMemoryChatStore {
    global: RwLock<Option<GlobalChatBlock>>,
    restrictions: RwLock<Vec<UserChatRestriction>>,
    feed: Option<Arc<ChangeFeed>>,
    fail_reads: AtomicBool,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes writes to `feed`.
    pub fn with_feed(mut self, feed: Arc<ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Makes every read fail, for exercising fail-closed paths.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn restrictions(&self) -> Vec<UserChatRestriction> {
        self.restrictions.read().await.clone()
    }

    fn check_reads(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::database("chat store unavailable"));
        }
        Ok(())
    }

    async fn announce(&self, topic: ChangeTopic, change_type: ChangeType, row: serde_json::Value) {
        if let Some(feed) = &self.feed {
            feed.publish(
                topic,
                RowChange {
                    change_type,
                    new_row: Some(row),
                },
            )
            .await;
        }
    }
}

#[async_trait]
impl ChatRestrictionReader for InMemoryChatStore {
    async fn global_block(&self) -> Result<Option<GlobalChatBlock>, DomainError> {
        self.check_reads()?;
        Ok(self.global.read().await.clone())
    }

    async fn active_user_restriction(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<UserChatRestriction>, DomainError> {
        self.check_reads()?;
        Ok(self
            .restrictions
            .read()
            .await
            .iter()
            .filter(|r| &r.user_id == user_id && r.is_active_at(&now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}

#[async_trait]
impl ChatModeration for InMemoryChatStore {
    async fn add_restriction(&self, restriction: &UserChatRestriction) -> Result<(), DomainError> {
        self.restrictions.write().await.push(restriction.clone());
        let row = serde_json::to_value(restriction).unwrap_or_default();
        self.announce(
            ChangeTopic::UserRestrictions(restriction.user_id),
            ChangeType::Insert,
            row,
        )
        .await;
        Ok(())
    }

    async fn set_global_block(&self, block: &GlobalChatBlock) -> Result<(), DomainError> {
        *self.global.write().await = Some(block.clone());
        let row = serde_json::to_value(block).unwrap_or_default();
        self.announce(ChangeTopic::GlobalChatSettings, ChangeType::Update, row)
            .await;
        Ok(())
    }

    async fn clear_global_block(&self) -> Result<(), DomainError> {
        *self.global.write().await = None;
        self.announce(
            ChangeTopic::GlobalChatSettings,
            ChangeType::Delete,
            serde_json::Value::Null,
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_restrictions_are_ignored() {
        let store = InMemoryChatStore::new();
        let user = UserId::new();
        let restriction =
            UserChatRestriction::new(user, None, Timestamp::now().plus_secs(60), None).unwrap();
        store.add_restriction(&restriction).await.unwrap();

        let later = Timestamp::now().plus_secs(120);
        assert!(store.active_user_restriction(&user, later).await.unwrap().is_none());
        assert!(store
            .active_user_restriction(&user, Timestamp::now())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn writes_are_announced_on_the_feed() {
        let feed = Arc::new(ChangeFeed::default());
        let store = InMemoryChatStore::new().with_feed(feed.clone());
        let mut rx = feed.subscribe(ChangeTopic::GlobalChatSettings).await;

        store
            .set_global_block(&GlobalChatBlock {
                reason: Some("maintenance".into()),
                blocked_until: Some(Timestamp::now().plus_secs(60)),
            })
            .await
            .unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.change_type, ChangeType::Update);
    }

    #[tokio::test]
    async fn failing_reads_surface_as_errors() {
        let store = InMemoryChatStore::new();
        store.fail_reads(true);
        assert!(store.global_block().await.is_err());
    }
}
