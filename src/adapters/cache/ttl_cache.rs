//! Time-bounded in-memory cache.
//!
//! Entries remember when they were inserted and are treated as absent once
//! older than the configured TTL. Expired entries are dropped lazily on read
//! and in bulk by `purge_expired`.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Key/value cache with a fixed time-to-live per entry.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if it is younger than the TTL.
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: remove unless a fresher value was set meanwhile.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .map(|e| e.inserted_at.elapsed() >= self.ttl)
            .unwrap_or(false)
        {
            entries.remove(key);
        }
        None
    }

    /// Inserts or replaces a value, restarting its TTL.
    pub async fn set(&self, key: K, value: V) {
        self.entries.write().await.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes a key. Returns whether it was present.
    pub async fn invalidate(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_fresh_values() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1).await;
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.get(&"b").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&"a").await, Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn set_restarts_the_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("a", 1).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("a", 2).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&"a").await, Some(2));
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1).await;
        assert!(cache.invalidate(&"a").await);
        assert!(!cache.invalidate(&"a").await);
        assert_eq!(cache.get(&"a").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("old", 1).await;
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.set("new", 2).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&"new").await, Some(2));
    }
}
