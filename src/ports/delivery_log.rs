//! DeliveryLog port - append-only record of outbound delivery attempts.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::outbound::OutboundDelivery;

#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Appends one delivery row.
    async fn record(&self, delivery: &OutboundDelivery) -> Result<(), DomainError>;
}
