//! Outbound webhook handlers.
//!
//! - Dispatch passes over the event bus, on demand or on an interval
//! - Subscriber administration

mod dispatch_outbound;
mod manage_subscriptions;

pub use dispatch_outbound::{
    DispatchOptions, DispatchOutboundHandler, DispatchReport, OutboundDispatchLoop,
};
pub use manage_subscriptions::{CreateSubscriptionCommand, ManageSubscriptionsHandler};
