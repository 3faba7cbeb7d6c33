//! OutboundSubscriptionRepository port - third-party webhook subscribers.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OutboundSubscriptionId, Timestamp};
use crate::domain::outbound::OutboundSubscription;

#[async_trait]
pub trait OutboundSubscriptionRepository: Send + Sync {
    /// All subscribers currently receiving events.
    async fn list_active(&self) -> Result<Vec<OutboundSubscription>, DomainError>;

    /// Persists a new subscriber.
    async fn save(&self, subscription: &OutboundSubscription) -> Result<(), DomainError>;

    /// Resets `failures_count` to 0 and stamps `last_delivery_at`.
    async fn record_success(
        &self,
        id: &OutboundSubscriptionId,
        at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Increments `failures_count` by exactly one.
    ///
    /// Implementations must increment atomically rather than write back a
    /// value read earlier.
    async fn record_failure(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError>;

    /// Stops deliveries to a subscriber.
    ///
    /// # Errors
    ///
    /// `SubscriptionNotFound` if no subscriber has this id.
    async fn deactivate(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError>;
}
