//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types that form the
//! vocabulary of the membergate domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, UserRole, SERVICE_ROLE};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    BusEventId, DeliveryId, OutboundSubscriptionId, RestrictionId, TrackingConfigId, UserId,
    WebhookEndpointId, WebhookEventId,
};
pub use timestamp::Timestamp;
