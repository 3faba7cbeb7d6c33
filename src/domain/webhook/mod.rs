//! Inbound payment-provider webhooks.
//!
//! Providers, endpoint configuration, stored events, idempotency keys and
//! signature checks. The receiving workflow itself lives in
//! `application::handlers::webhook`.

mod endpoint;
mod errors;
mod event;
mod idempotency;
mod provider;
pub mod signature;

pub use endpoint::{WebhookEndpoint, WebhookEndpointSummary};
pub use errors::WebhookError;
pub use event::{WebhookEvent, WebhookEventStatus};
pub use idempotency::{extract_event_type, extract_order_id, IdempotencyKey, UNKNOWN_EVENT_TYPE};
pub use provider::{Provider, VerificationStrategy};
