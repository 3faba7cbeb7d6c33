//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Inbound Webhook Ports
//!
//! - `WebhookEndpointRepository` - Provider endpoint configuration
//! - `WebhookEventStore` - Idempotency store for raw provider events
//!
//! ## Outbound Dispatch Ports
//!
//! - `EventBusRepository` - Canonical events awaiting dispatch
//! - `OutboundSubscriptionRepository` - Subscribers and their health counters
//! - `DeliveryLog` - Delivery attempt records
//! - `WebhookSender` - HTTP client for deliveries
//!
//! ## Tracking Ports
//!
//! - `TrackingConfigReader`, `TrackingEventLog`, `ConversionsApi`
//!
//! ## Chat Ports
//!
//! - `ChatRestrictionReader`, `ChatModeration`
//!
//! ## Collaborators
//!
//! - RPC ports in `rpc` (canonical processing, cleanup, referrals, checkout,
//!   auto-status, role lookup)
//! - `SessionValidator` - Bearer token validation

mod chat_restrictions;
mod conversion_tracking;
mod delivery_log;
mod event_bus_repository;
mod outbound_subscription_repository;
mod rpc;
mod session_validator;
mod webhook_endpoint_repository;
mod webhook_event_repository;
mod webhook_sender;

pub use chat_restrictions::{ChatModeration, ChatRestrictionReader};
pub use conversion_tracking::{
    ConversionsApi, ConversionsApiError, TrackingConfigReader, TrackingEventLog,
};
pub use delivery_log::DeliveryLog;
pub use event_bus_repository::EventBusRepository;
pub use outbound_subscription_repository::OutboundSubscriptionRepository;
pub use rpc::{
    AutoStatusScheduler, CanonicalEventProcessor, CheckoutLinks, CleanupRequest,
    ProcessWebhookEventOutput, ReferralOutcome, ReferralProcessor, ReferralPurchase, RoleLookup,
    RpcError, SystemCleanup,
};
pub use session_validator::SessionValidator;
pub use webhook_endpoint_repository::WebhookEndpointRepository;
pub use webhook_event_repository::{SaveResult, WebhookEventStore};
pub use webhook_sender::{SendError, SenderResponse, WebhookSender};
