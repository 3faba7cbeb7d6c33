//! Inbound webhook handlers.
//!
//! ## Commands
//! - Receiving a provider webhook (verify, de-duplicate, store, process)
//! - Creating and deactivating provider endpoints (admin)

mod manage_endpoints;
mod receive_webhook;

pub use manage_endpoints::{CreateWebhookEndpointCommand, ManageWebhookEndpointsHandler};
pub use receive_webhook::{
    ReceiveWebhookCommand, ReceiveWebhookHandler, ReceiveWebhookResult, HOTMART_TOKEN_HEADER,
    KIWIFY_SIGNATURE_HEADER, KIWIFY_SIGNATURE_PARAM, SHARED_SECRET_HEADER, SHARED_SECRET_PARAM,
};
