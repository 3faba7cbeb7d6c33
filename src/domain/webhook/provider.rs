//! Payment providers that can deliver webhooks to us.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// A payment provider with a configured inbound webhook endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Hotmart,
    Kiwify,
    Caktor,
    Generic,
}

/// How a provider's requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStrategy {
    /// Presence of the `x-hotmart-hottok` header marks the event verified.
    HeaderTokenPresence,
    /// HMAC-SHA256 of the raw body, enforced only when the endpoint requires it.
    HmacSignature,
    /// Shared secret passed as `?secret=` or `x-webhook-secret`.
    SharedSecret,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Hotmart,
        Provider::Kiwify,
        Provider::Caktor,
        Provider::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Hotmart => "hotmart",
            Provider::Kiwify => "kiwify",
            Provider::Caktor => "caktor",
            Provider::Generic => "generic",
        }
    }

    pub fn verification(&self) -> VerificationStrategy {
        match self {
            Provider::Hotmart => VerificationStrategy::HeaderTokenPresence,
            Provider::Kiwify => VerificationStrategy::HmacSignature,
            Provider::Caktor | Provider::Generic => VerificationStrategy::SharedSecret,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotmart" => Ok(Provider::Hotmart),
            "kiwify" => Ok(Provider::Kiwify),
            "caktor" => Ok(Provider::Caktor),
            "generic" => Ok(Provider::Generic),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown provider '{}'", other),
            )),
        }
    }
}
