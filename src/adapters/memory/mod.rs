//! In-memory adapters for development and testing.
//!
//! Every store port has a lock-guarded implementation here with the same
//! observable behavior as its Postgres counterpart, including idempotency-key
//! uniqueness and change announcements.

mod chat;
mod outbound;
mod rpc;
mod tracking;
mod webhooks;

pub use chat::InMemoryChatStore;
pub use outbound::{InMemoryDeliveryLog, InMemoryEventBus, InMemoryOutboundSubscriptions};
pub use rpc::{InMemoryRoles, RecordingCanonicalProcessor, StubProcedures};
pub use tracking::InMemoryTrackingStore;
pub use webhooks::{InMemoryWebhookEndpoints, InMemoryWebhookEvents};
