//! Administration of outbound subscribers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::domain::foundation::{DomainError, OutboundSubscriptionId};
use crate::domain::outbound::{OutboundSubscription, OutboundSubscriptionSummary};
use crate::ports::OutboundSubscriptionRepository;

#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub name: String,
    pub target_url: String,
    pub secret: Option<SecretString>,
}

pub struct ManageSubscriptionsHandler {
    subscriptions: Arc<dyn OutboundSubscriptionRepository>,
}

impl ManageSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn OutboundSubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn create(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<OutboundSubscriptionSummary, DomainError> {
        let subscription = OutboundSubscription::new(cmd.name, cmd.target_url, cmd.secret)?;
        self.subscriptions.save(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            name = %subscription.name,
            signed = subscription.secret.is_some(),
            "Outbound subscription created"
        );
        Ok(subscription.summary())
    }

    pub async fn deactivate(&self, id: &OutboundSubscriptionId) -> Result<(), DomainError> {
        self.subscriptions.deactivate(id).await?;
        tracing::info!(subscription_id = %id, "Outbound subscription deactivated");
        Ok(())
    }
}
