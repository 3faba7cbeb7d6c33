//! WebhookEndpointRepository port - inbound endpoint configuration.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, WebhookEndpointId};
use crate::domain::webhook::{Provider, WebhookEndpoint};

#[async_trait]
pub trait WebhookEndpointRepository: Send + Sync {
    /// Returns the active endpoint for a provider.
    ///
    /// When several are active, the most recently created one wins.
    async fn find_active(&self, provider: Provider) -> Result<Option<WebhookEndpoint>, DomainError>;

    /// Persists a new endpoint.
    async fn save(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError>;

    /// Marks an endpoint inactive. Endpoints are never deleted.
    ///
    /// # Errors
    ///
    /// `EndpointNotFound` if no endpoint has this id.
    async fn deactivate(&self, id: &WebhookEndpointId) -> Result<(), DomainError>;
}
