//! Outbound webhooks: queued domain events, subscribers, and delivery records.

mod bus_entry;
mod delivery;
mod envelope;
mod subscription;

pub use bus_entry::{BusEventStatus, EventBusEntry};
pub use delivery::{
    truncate_body, DeliveryStatus, OutboundDelivery, FIRST_ATTEMPT, MAX_RESPONSE_BODY_CHARS,
};
pub use envelope::{DeliveryEnvelope, SignedDelivery};
pub use subscription::{OutboundSubscription, OutboundSubscriptionSummary};
