//! Periodic cleanup of in-process realtime state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::adapters::cache::CachedRoleLookup;

use super::ChangeFeed;

/// Sweeps feed channels left behind by vanished subscribers and expired
/// role cache entries.
pub struct RealtimeSweeper {
    feed: Arc<ChangeFeed>,
    role_cache: Option<Arc<CachedRoleLookup>>,
    interval: Duration,
}

impl RealtimeSweeper {
    pub fn new(feed: Arc<ChangeFeed>, interval: Duration) -> Self {
        Self {
            feed,
            role_cache: None,
            interval,
        }
    }

    pub fn with_role_cache(mut self, cache: Arc<CachedRoleLookup>) -> Self {
        self.role_cache = Some(cache);
        self
    }

    /// One pass. Returns (topics pruned, roles purged).
    pub async fn sweep_once(&self) -> (usize, usize) {
        let topics = self.feed.prune().await;
        let roles = match &self.role_cache {
            Some(cache) => cache.purge_expired().await,
            None => 0,
        };
        if topics > 0 || roles > 0 {
            tracing::debug!(topics, roles, "Swept realtime state");
        }
        (topics, roles)
    }

    /// Sweeps on every tick until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
        tracing::info!("Realtime sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRoles;
    use crate::adapters::realtime::ChangeTopic;
    use crate::domain::foundation::UserId;
    use crate::ports::RoleLookup;

    fn role_cache(ttl: Duration) -> Arc<CachedRoleLookup> {
        Arc::new(CachedRoleLookup::new(Arc::new(InMemoryRoles::new()), ttl))
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_prunes_abandoned_topics_and_expired_roles() {
        let feed = Arc::new(ChangeFeed::default());
        let cache = role_cache(Duration::from_secs(60));
        let _live = feed.subscribe(ChangeTopic::GlobalChatSettings).await;
        for _ in 0..5 {
            drop(feed.subscribe(ChangeTopic::Profile(UserId::new())).await);
        }
        for _ in 0..3 {
            cache.get_user_role(&UserId::new()).await.unwrap();
        }
        let sweeper = RealtimeSweeper::new(feed.clone(), Duration::from_secs(30))
            .with_role_cache(cache.clone());

        assert_eq!(sweeper.sweep_once().await, (5, 0));
        assert_eq!(feed.topic_count().await, 1);

        time::advance(Duration::from_secs(61)).await;
        assert_eq!(sweeper.sweep_once().await, (0, 3));
        assert_eq!(cache.cached_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_sweeps_until_shutdown() {
        let feed = Arc::new(ChangeFeed::default());
        drop(feed.subscribe(ChangeTopic::Profile(UserId::new())).await);
        let sweeper = RealtimeSweeper::new(feed.clone(), Duration::from_secs(30));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(async move { sweeper.run(rx).await });

        time::sleep(Duration::from_secs(31)).await;
        assert_eq!(feed.topic_count().await, 0);

        tx.send(true).unwrap();
        time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
