//! Typed change feed for the tables the chat resolver depends on.
//!
//! Each topic is a (table, row filter) pair with its own broadcast channel.
//! Channels are created on first subscribe. Closing a subscriber releases
//! its topics, and `prune` sweeps channels whose listeners went away without
//! closing.
//!
//! ```text
//! Topic: UserRestrictions(u1)   Topic: GlobalChatSettings   Topic: Profile(u1)
//! ├── watcher (tab a)           ├── watcher (tab a)         ├── watcher (tab a)
//! └── watcher (tab b)           ├── watcher (tab b)         └── watcher (tab b)
//!                               └── watcher (user u2)
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::domain::foundation::UserId;

pub const USER_RESTRICTIONS_TABLE: &str = "user_chat_restrictions";
pub const CHAT_SETTINGS_TABLE: &str = "chat_settings";
pub const PROFILES_TABLE: &str = "profiles";

/// What a subscriber listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTopic {
    /// `user_chat_restrictions` rows with `user_id = <id>`.
    UserRestrictions(UserId),
    /// Any `chat_settings` row.
    GlobalChatSettings,
    /// The `profiles` row with `id = <id>`.
    Profile(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

/// A single row change delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange {
    pub change_type: ChangeType,
    pub new_row: Option<Value>,
}

/// Wire format of database change notifications.
#[derive(Debug, Deserialize)]
struct ChangeNotification {
    table: String,
    #[serde(rename = "type")]
    change_type: ChangeType,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
}

/// Decodes a notification payload into its topic and change.
///
/// Returns `None` for tables outside the feed or rows without a usable id.
pub fn decode_notification(payload: &str) -> Option<(ChangeTopic, RowChange)> {
    let notification: ChangeNotification = serde_json::from_str(payload).ok()?;
    let row = notification
        .record
        .as_ref()
        .or(notification.old_record.as_ref());

    let topic = match notification.table.as_str() {
        USER_RESTRICTIONS_TABLE => ChangeTopic::UserRestrictions(user_id_field(row?, "user_id")?),
        CHAT_SETTINGS_TABLE => ChangeTopic::GlobalChatSettings,
        PROFILES_TABLE => ChangeTopic::Profile(user_id_field(row?, "id")?),
        _ => return None,
    };

    Some((
        topic,
        RowChange {
            change_type: notification.change_type,
            new_row: notification.record,
        },
    ))
}

fn user_id_field(row: &Value, field: &str) -> Option<UserId> {
    row.get(field)?.as_str()?.parse().ok()
}

/// Registry of per-topic broadcast channels.
pub struct ChangeFeed {
    topics: RwLock<HashMap<ChangeTopic, broadcast::Sender<RowChange>>>,
    channel_capacity: usize,
}

impl ChangeFeed {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(64)
    }

    /// Subscribes to a topic, creating its channel if needed.
    pub async fn subscribe(&self, topic: ChangeTopic) -> broadcast::Receiver<RowChange> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .subscribe()
    }

    /// Delivers a change to the topic's subscribers.
    ///
    /// Returns how many subscribers received it. Publishing to a topic nobody
    /// listens to is a no-op; a topic whose listeners are all gone is pruned.
    pub async fn publish(&self, topic: ChangeTopic, change: RowChange) -> usize {
        let delivered = {
            let topics = self.topics.read().await;
            match topics.get(&topic) {
                Some(sender) => sender.send(change).unwrap_or(0),
                None => return 0,
            }
        };

        if delivered == 0 {
            let mut topics = self.topics.write().await;
            if topics.get(&topic).map(|s| s.receiver_count() == 0).unwrap_or(false) {
                topics.remove(&topic);
            }
        }
        delivered
    }

    /// Removes the topic's channel if its last listener is gone.
    ///
    /// Returns whether the channel was removed.
    pub async fn release(&self, topic: &ChangeTopic) -> bool {
        let mut topics = self.topics.write().await;
        if topics.get(topic).map(|s| s.receiver_count() == 0).unwrap_or(false) {
            topics.remove(topic);
            return true;
        }
        false
    }

    /// Drops channels without listeners and returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut topics = self.topics.write().await;
        let before = topics.len();
        topics.retain(|_, sender| sender.receiver_count() > 0);
        before - topics.len()
    }

    /// Number of topics with an open channel.
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    pub async fn subscriber_count(&self, topic: &ChangeTopic) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
