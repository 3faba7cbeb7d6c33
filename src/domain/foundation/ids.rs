//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID-backed identifier with the usual constructors and
/// `Display`/`FromStr` impls.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a platform user (the auth provider's subject).
    UserId
);

uuid_id!(
    /// Identifier of a configured inbound webhook endpoint.
    WebhookEndpointId
);

uuid_id!(
    /// Identifier of a stored inbound webhook event.
    WebhookEventId
);

uuid_id!(
    /// Identifier of a domain event waiting in the outbound event bus.
    BusEventId
);

uuid_id!(
    /// Identifier of a third-party outbound webhook subscriber.
    OutboundSubscriptionId
);

uuid_id!(
    /// Identifier of one outbound delivery attempt.
    DeliveryId
);

uuid_id!(
    /// Identifier of a conversion-tracking configuration row.
    TrackingConfigId
);

uuid_id!(
    /// Identifier of a per-user chat restriction row.
    RestrictionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(WebhookEventId::new(), WebhookEventId::new());
    }

    #[test]
    fn id_parses_from_string() {
        let uuid = Uuid::new_v4();
        let parsed: UserId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }

    #[test]
    fn id_rejects_invalid_string() {
        assert!("not-a-uuid".parse::<BusEventId>().is_err());
    }

    #[test]
    fn id_displays_inner_uuid() {
        let uuid = Uuid::new_v4();
        let id = DeliveryId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let id = OutboundSubscriptionId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
