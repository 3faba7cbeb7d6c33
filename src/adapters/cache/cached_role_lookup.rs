//! Role lookup with a TTL cache in front of the remote procedure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{UserId, UserRole};
use crate::ports::{RoleLookup, RpcError};

use super::TtlCache;

/// Caches successful role lookups per user. Failures are never cached.
pub struct CachedRoleLookup {
    inner: Arc<dyn RoleLookup>,
    cache: TtlCache<UserId, UserRole>,
}

impl CachedRoleLookup {
    pub fn new(inner: Arc<dyn RoleLookup>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    /// Forgets a user's cached role, e.g. after their profile changed.
    pub async fn invalidate(&self, user_id: &UserId) {
        if self.cache.invalidate(user_id).await {
            tracing::debug!(user_id = %user_id, "Role cache entry invalidated");
        }
    }

    /// Drops expired roles. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.len().await
    }
}

#[async_trait]
impl RoleLookup for CachedRoleLookup {
    async fn get_user_role(&self, user_id: &UserId) -> Result<UserRole, RpcError> {
        if let Some(role) = self.cache.get(user_id).await {
            return Ok(role);
        }

        let role = self.inner.get_user_role(user_id).await?;
        self.cache.set(*user_id, role).await;
        Ok(role)
    }
}
