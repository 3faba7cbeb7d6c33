//! In-memory webhook endpoint and event stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, WebhookEndpointId};
use crate::domain::webhook::{IdempotencyKey, Provider, WebhookEndpoint, WebhookEvent};
use crate::ports::{SaveResult, WebhookEndpointRepository, WebhookEventStore};

#[derive(Debug, Default)]
pub struct InMemoryWebhookEndpoints {
    endpoints: RwLock<Vec<WebhookEndpoint>>,
}

impl InMemoryWebhookEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an endpoint.
    pub async fn insert(&self, endpoint: WebhookEndpoint) {
        self.endpoints.write().await.push(endpoint);
    }

    pub async fn all(&self) -> Vec<WebhookEndpoint> {
        self.endpoints.read().await.clone()
    }
}

#[async_trait]
impl WebhookEndpointRepository for InMemoryWebhookEndpoints {
    async fn find_active(&self, provider: Provider) -> Result<Option<WebhookEndpoint>, DomainError> {
        Ok(self
            .endpoints
            .read()
            .await
            .iter()
            .filter(|e| e.provider == provider && e.active)
            .max_by_key(|e| e.created_at)
            .cloned())
    }

    async fn save(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError> {
        self.endpoints.write().await.push(endpoint.clone());
        Ok(())
    }

    async fn deactivate(&self, id: &WebhookEndpointId) -> Result<(), DomainError> {
        let mut endpoints = self.endpoints.write().await;
        let endpoint = endpoints.iter_mut().find(|e| &e.id == id).ok_or_else(|| {
            DomainError::new(ErrorCode::EndpointNotFound, format!("Endpoint {} not found", id))
        })?;
        endpoint.active = false;
        Ok(())
    }
}

/// Event store keyed by idempotency key, mirroring the UNIQUE constraint.
#[derive(Debug, Default)]
pub struct InMemoryWebhookEvents {
    events: RwLock<HashMap<IdempotencyKey, WebhookEvent>>,
    fail_writes: AtomicBool,
}

impl InMemoryWebhookEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn all(&self) -> Vec<WebhookEvent> {
        self.events.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl WebhookEventStore for InMemoryWebhookEvents {
    async fn insert(&self, event: &WebhookEvent) -> Result<SaveResult, DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("connection refused"));
        }

        let mut events = self.events.write().await;
        if events.contains_key(&event.idempotency_key) {
            return Ok(SaveResult::AlreadyExists);
        }
        events.insert(event.idempotency_key.clone(), event.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        Ok(self.events.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use secrecy::SecretString;
    use serde_json::json;

    fn endpoint(provider: Provider) -> WebhookEndpoint {
        WebhookEndpoint::new(provider, "https://x.test", SecretString::new("s".into()), false).unwrap()
    }

    #[tokio::test]
    async fn find_active_ignores_inactive_and_other_providers() {
        let repo = InMemoryWebhookEndpoints::new();
        let mut inactive = endpoint(Provider::Kiwify);
        inactive.active = false;
        repo.insert(inactive).await;
        repo.insert(endpoint(Provider::Hotmart)).await;

        assert!(repo.find_active(Provider::Kiwify).await.unwrap().is_none());
        assert!(repo.find_active(Provider::Hotmart).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn find_active_prefers_newest() {
        let repo = InMemoryWebhookEndpoints::new();
        let mut older = endpoint(Provider::Generic);
        older.created_at = Timestamp::now().plus_secs(-60);
        let newer = endpoint(Provider::Generic);
        repo.insert(older).await;
        repo.insert(newer.clone()).await;

        let found = repo.find_active(Provider::Generic).await.unwrap().unwrap();
        assert_eq!(found.id, newer.id);
    }

    #[tokio::test]
    async fn deactivate_unknown_endpoint_is_not_found() {
        let repo = InMemoryWebhookEndpoints::new();
        let err = repo.deactivate(&WebhookEndpointId::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EndpointNotFound);
    }

    #[tokio::test]
    async fn duplicate_key_reports_already_exists() {
        let store = InMemoryWebhookEvents::new();
        let key = IdempotencyKey::from_parts(Provider::Kiwify, "o1", "paid");
        let event = WebhookEvent::received(Provider::Kiwify, json!({}), json!({}), key.clone(), true);
        let replay = WebhookEvent::received(Provider::Kiwify, json!({}), json!({}), key, true);

        assert_eq!(store.insert(&event).await.unwrap(), SaveResult::Inserted);
        assert_eq!(store.insert(&replay).await.unwrap(), SaveResult::AlreadyExists);
        assert_eq!(store.count().await, 1);
    }
}
