//! Live chat restriction updates for one user.
//!
//! A watcher listens to three change topics:
//!
//! - the user's rows in `user_chat_restrictions`
//! - the `chat_settings` table (global block)
//! - the user's `profiles` row (role changes)
//!
//! Bursts of notifications are debounced into a single re-evaluation whose
//! result is published on a `watch` channel. Closing or dropping the watcher
//! stops its task and releases its topics from the feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::adapters::cache::CachedRoleLookup;
use crate::adapters::realtime::{ChangeFeed, ChangeTopic, RowChange};
use crate::domain::chat::ChatRestriction;
use crate::domain::foundation::UserId;

use super::ResolveChatRestrictionHandler;

/// Creates [`RestrictionWatcher`]s sharing one resolver and change feed.
#[derive(Clone)]
pub struct RestrictionWatchers {
    resolver: Arc<ResolveChatRestrictionHandler>,
    feed: Arc<ChangeFeed>,
    role_cache: Option<Arc<CachedRoleLookup>>,
    debounce: Duration,
}

impl RestrictionWatchers {
    pub fn new(
        resolver: Arc<ResolveChatRestrictionHandler>,
        feed: Arc<ChangeFeed>,
        debounce: Duration,
    ) -> Self {
        Self {
            resolver,
            feed,
            role_cache: None,
            debounce,
        }
    }

    /// Profile changes evict the user's entry from `cache` before re-evaluating.
    pub fn with_role_cache(mut self, cache: Arc<CachedRoleLookup>) -> Self {
        self.role_cache = Some(cache);
        self
    }

    /// Evaluates the user's current restriction and starts watching for changes.
    pub async fn watch(&self, user_id: UserId) -> RestrictionWatcher {
        let [restrictions, settings, profile] = topics(user_id);
        let subscriptions = Subscriptions {
            restrictions: self.feed.subscribe(restrictions).await,
            settings: self.feed.subscribe(settings).await,
            profile: self.feed.subscribe(profile).await,
        };

        let initial = self.resolver.check(&user_id).await;
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(watch_loop(
            user_id,
            self.resolver.clone(),
            self.role_cache.clone(),
            self.debounce,
            subscriptions,
            tx,
        ));

        tracing::debug!(user_id = %user_id, "Chat restriction watcher started");
        RestrictionWatcher {
            user_id,
            updates: rx,
            feed: self.feed.clone(),
            task: Some(task),
        }
    }
}

/// Handle to a running watch. Dropping it stops the watch.
pub struct RestrictionWatcher {
    user_id: UserId,
    updates: watch::Receiver<ChatRestriction>,
    feed: Arc<ChangeFeed>,
    task: Option<JoinHandle<()>>,
}

impl RestrictionWatcher {
    /// The most recent evaluation.
    pub fn current(&self) -> ChatRestriction {
        self.updates.borrow().clone()
    }

    /// A receiver notified on every re-evaluation.
    pub fn updates(&self) -> watch::Receiver<ChatRestriction> {
        self.updates.clone()
    }

    /// Stops the watch and waits until its topics are released.
    pub async fn close(mut self) {
        if let Some(task) = self.task.take() {
            stop(task, self.feed.clone(), self.user_id).await;
        }
    }
}

impl Drop for RestrictionWatcher {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        // Without a runtime the channels are left for `ChangeFeed::prune`.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(stop(task, self.feed.clone(), self.user_id));
        }
    }
}

fn topics(user_id: UserId) -> [ChangeTopic; 3] {
    [
        ChangeTopic::UserRestrictions(user_id),
        ChangeTopic::GlobalChatSettings,
        ChangeTopic::Profile(user_id),
    ]
}

/// Aborts the loop, waits for it to drop its receivers, then releases the
/// topics nobody else listens to.
async fn stop(task: JoinHandle<()>, feed: Arc<ChangeFeed>, user_id: UserId) {
    task.abort();
    let _ = task.await;
    for topic in topics(user_id) {
        feed.release(&topic).await;
    }
    tracing::debug!(user_id = %user_id, "Chat restriction watcher stopped");
}

struct Subscriptions {
    restrictions: broadcast::Receiver<RowChange>,
    settings: broadcast::Receiver<RowChange>,
    profile: broadcast::Receiver<RowChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Restrictions,
    Settings,
    Profile,
}

impl Subscriptions {
    /// Waits for the next change on any topic. `None` once the feed is gone.
    async fn next(&mut self) -> Option<Trigger> {
        let (trigger, result) = tokio::select! {
            r = self.restrictions.recv() => (Trigger::Restrictions, r),
            r = self.settings.recv() => (Trigger::Settings, r),
            r = self.profile.recv() => (Trigger::Profile, r),
        };
        match result {
            Ok(_) => Some(trigger),
            // Missed changes still mean the state may have moved.
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Restriction watcher lagged behind the change feed");
                Some(trigger)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

async fn watch_loop(
    user_id: UserId,
    resolver: Arc<ResolveChatRestrictionHandler>,
    role_cache: Option<Arc<CachedRoleLookup>>,
    debounce: Duration,
    mut subscriptions: Subscriptions,
    tx: watch::Sender<ChatRestriction>,
) {
    while let Some(first) = subscriptions.next().await {
        let mut profile_changed = first == Trigger::Profile;

        // Trailing-edge debounce: every new change pushes the deadline out.
        let mut deadline = Instant::now() + debounce;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                next = subscriptions.next() => match next {
                    Some(trigger) => {
                        profile_changed |= trigger == Trigger::Profile;
                        deadline = Instant::now() + debounce;
                    }
                    None => return,
                },
            }
        }

        if profile_changed {
            if let Some(cache) = &role_cache {
                cache.invalidate(&user_id).await;
            }
        }

        let restriction = resolver.check(&user_id).await;
        tracing::debug!(
            user_id = %user_id,
            is_blocked = restriction.is_blocked,
            "Chat restriction re-evaluated"
        );
        if tx.send(restriction).is_err() {
            return;
        }
    }
}
