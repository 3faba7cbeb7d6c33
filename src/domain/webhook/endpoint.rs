//! Configured inbound webhook endpoint.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{Timestamp, ValidationError, WebhookEndpointId};

use super::Provider;

/// Inbound endpoint configuration for one provider.
///
/// Created by an administrator and deactivated rather than deleted. The
/// receiver looks up the active endpoint of its provider on every request.
#[derive(Debug, Clone)]
pub struct WebhookEndpoint {
    pub id: WebhookEndpointId,
    pub provider: Provider,
    pub url: String,
    pub secret: SecretString,
    pub active: bool,
    pub require_signature: bool,
    pub created_at: Timestamp,
}

impl WebhookEndpoint {
    /// Creates a new active endpoint.
    pub fn new(
        provider: Provider,
        url: impl Into<String>,
        secret: SecretString,
        require_signature: bool,
    ) -> Result<Self, ValidationError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ValidationError::empty_field("url"));
        }
        if require_signature && secret.expose_secret().is_empty() {
            return Err(ValidationError::invalid_format(
                "secret",
                "a secret is required when signatures are enforced",
            ));
        }

        Ok(Self {
            id: WebhookEndpointId::new(),
            provider,
            url,
            secret,
            active: true,
            require_signature,
            created_at: Timestamp::now(),
        })
    }

    /// Returns the endpoint secret bytes for signature checks.
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }

    /// Admin-facing view with the secret removed.
    pub fn summary(&self) -> WebhookEndpointSummary {
        WebhookEndpointSummary {
            id: self.id,
            provider: self.provider,
            url: self.url.clone(),
            active: self.active,
            require_signature: self.require_signature,
            created_at: self.created_at,
        }
    }
}

/// Serializable endpoint without its secret.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookEndpointSummary {
    pub id: WebhookEndpointId,
    pub provider: Provider,
    pub url: String,
    pub active: bool,
    pub require_signature: bool,
    pub created_at: Timestamp,
}
