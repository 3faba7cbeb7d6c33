//! Administration of inbound endpoints.

use std::sync::Arc;

use secrecy::SecretString;

use crate::domain::foundation::{DomainError, WebhookEndpointId};
use crate::domain::webhook::{Provider, WebhookEndpoint, WebhookEndpointSummary};
use crate::ports::WebhookEndpointRepository;

#[derive(Debug, Clone)]
pub struct CreateWebhookEndpointCommand {
    pub provider: Provider,
    pub url: String,
    pub secret: SecretString,
    pub require_signature: bool,
}

pub struct ManageWebhookEndpointsHandler {
    endpoints: Arc<dyn WebhookEndpointRepository>,
}

impl ManageWebhookEndpointsHandler {
    pub fn new(endpoints: Arc<dyn WebhookEndpointRepository>) -> Self {
        Self { endpoints }
    }

    /// Creates an active endpoint. Older endpoints of the provider stay active
    /// but the newest one wins on lookup.
    pub async fn create(
        &self,
        cmd: CreateWebhookEndpointCommand,
    ) -> Result<WebhookEndpointSummary, DomainError> {
        let endpoint =
            WebhookEndpoint::new(cmd.provider, cmd.url, cmd.secret, cmd.require_signature)?;
        self.endpoints.save(&endpoint).await?;

        tracing::info!(
            endpoint_id = %endpoint.id,
            provider = %endpoint.provider,
            "Webhook endpoint created"
        );
        Ok(endpoint.summary())
    }

    pub async fn deactivate(&self, id: &WebhookEndpointId) -> Result<(), DomainError> {
        self.endpoints.deactivate(id).await?;
        tracing::info!(endpoint_id = %id, "Webhook endpoint deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryWebhookEndpoints;
    use crate::domain::foundation::ErrorCode;

    fn handler() -> (Arc<InMemoryWebhookEndpoints>, ManageWebhookEndpointsHandler) {
        let repo = Arc::new(InMemoryWebhookEndpoints::new());
        (repo.clone(), ManageWebhookEndpointsHandler::new(repo))
    }

    #[tokio::test]
    async fn created_endpoint_becomes_active() {
        let (repo, handler) = handler();
        let summary = handler
            .create(CreateWebhookEndpointCommand {
                provider: Provider::Kiwify,
                url: "https://api.test/webhook-kiwify".into(),
                secret: SecretString::new("s3cret".into()),
                require_signature: true,
            })
            .await
            .unwrap();

        let active = repo.find_active(Provider::Kiwify).await.unwrap().unwrap();
        assert_eq!(active.id, summary.id);
    }

    #[tokio::test]
    async fn signature_without_secret_is_rejected() {
        let (_, handler) = handler();
        let err = handler
            .create(CreateWebhookEndpointCommand {
                provider: Provider::Kiwify,
                url: "https://api.test/webhook-kiwify".into(),
                secret: SecretString::new(String::new()),
                require_signature: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn deactivating_unknown_endpoint_fails() {
        let (_, handler) = handler();
        let err = handler.deactivate(&WebhookEndpointId::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EndpointNotFound);
    }
}
