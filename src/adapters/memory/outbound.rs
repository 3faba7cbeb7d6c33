//! In-memory event bus, subscriber and delivery stores.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    BusEventId, DomainError, ErrorCode, OutboundSubscriptionId, Timestamp,
};
use crate::domain::outbound::{EventBusEntry, OutboundDelivery, OutboundSubscription};
use crate::ports::{DeliveryLog, EventBusRepository, OutboundSubscriptionRepository};

#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    entries: RwLock<Vec<EventBusEntry>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, entry: EventBusEntry) {
        self.entries.write().await.push(entry);
    }

    pub async fn get(&self, id: &BusEventId) -> Option<EventBusEntry> {
        self.entries.read().await.iter().find(|e| &e.id == id).cloned()
    }
}

#[async_trait]
impl EventBusRepository for InMemoryEventBus {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<EventBusEntry>, DomainError> {
        let entries = self.entries.read().await;
        let mut pending: Vec<EventBusEntry> =
            entries.iter().filter(|e| e.is_pending()).cloned().collect();
        pending.sort_by_key(|e| e.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_dispatched(&self, id: &BusEventId, at: Timestamp) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("Bus event {} not found", id)))?;
        entry.mark_dispatched(at);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOutboundSubscriptions {
    subscriptions: RwLock<Vec<OutboundSubscription>>,
}

impl InMemoryOutboundSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, subscription: OutboundSubscription) {
        self.subscriptions.write().await.push(subscription);
    }

    pub async fn get(&self, id: &OutboundSubscriptionId) -> Option<OutboundSubscription> {
        self.subscriptions
            .read()
            .await
            .iter()
            .find(|s| &s.id == id)
            .cloned()
    }

    async fn update<F>(&self, id: &OutboundSubscriptionId, f: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut OutboundSubscription) + Send,
    {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions.iter_mut().find(|s| &s.id == id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", id),
            )
        })?;
        f(subscription);
        Ok(())
    }
}

#[async_trait]
impl OutboundSubscriptionRepository for InMemoryOutboundSubscriptions {
    async fn list_active(&self) -> Result<Vec<OutboundSubscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect())
    }

    async fn save(&self, subscription: &OutboundSubscription) -> Result<(), DomainError> {
        self.subscriptions.write().await.push(subscription.clone());
        Ok(())
    }

    async fn record_success(
        &self,
        id: &OutboundSubscriptionId,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        self.update(id, |s| s.record_success(at)).await
    }

    async fn record_failure(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError> {
        self.update(id, |s| s.record_failure()).await
    }

    async fn deactivate(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError> {
        self.update(id, |s| s.active = false).await
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDeliveryLog {
    deliveries: RwLock<Vec<OutboundDelivery>>,
}

impl InMemoryDeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<OutboundDelivery> {
        self.deliveries.read().await.clone()
    }
}

#[async_trait]
impl DeliveryLog for InMemoryDeliveryLog {
    async fn record(&self, delivery: &OutboundDelivery) -> Result<(), DomainError> {
        self.deliveries.write().await.push(delivery.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_pending_is_fifo_and_bounded() {
        let bus = InMemoryEventBus::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut entry = EventBusEntry::pending("e", None, None, json!({ "i": i }));
            entry.created_at = Timestamp::now().plus_secs(i - 10);
            ids.push(entry.id);
            bus.push(entry).await;
        }

        let pending = bus.fetch_pending(3).await.unwrap();
        let got: Vec<_> = pending.iter().map(|e| e.id).collect();
        assert_eq!(got, ids[..3].to_vec());
    }

    #[tokio::test]
    async fn dispatched_entries_are_not_pending() {
        let bus = InMemoryEventBus::new();
        let entry = EventBusEntry::pending("e", None, None, json!({}));
        let id = entry.id;
        bus.push(entry).await;

        bus.mark_dispatched(&id, Timestamp::now()).await.unwrap();
        assert!(bus.fetch_pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_subscriptions_are_not_listed() {
        let repo = InMemoryOutboundSubscriptions::new();
        let sub = OutboundSubscription::new("crm", "https://crm.test", None).unwrap();
        let id = sub.id;
        repo.insert(sub).await;

        repo.deactivate(&id).await.unwrap();
        assert!(repo.list_active().await.unwrap().is_empty());
    }
}
