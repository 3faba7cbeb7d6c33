//! Remote procedure collaborators.
//!
//! Business logic such as canonical event mapping, referral accounting and
//! destructive cleanup lives in database procedures that this service only
//! invokes. Each procedure gets its own port with a typed input and output so
//! callers never deal with raw JSON, and so the implementation can move out of
//! the database without touching callers.
//!
//! | Port | Procedure |
//! |------|-----------|
//! | `CanonicalEventProcessor` | `process_webhook_event` |
//! | `SystemCleanup` | `run_system_cleanup` |
//! | `ReferralProcessor` | `process_referral_purchase` |
//! | `CheckoutLinks` | `create_checkout_url` |
//! | `AutoStatusScheduler` | `process_auto_status_schedules` |
//! | `RoleLookup` | `get_user_role` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::billing::Plan;
use crate::domain::foundation::{
    DomainError, ErrorCode, UserId, UserRole, ValidationError, WebhookEventId,
};

/// Failure of a remote procedure call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The procedure ran and refused the request.
    #[error("{procedure} rejected the call: {message}")]
    Rejected {
        procedure: &'static str,
        message: String,
    },

    /// The procedure returned something other than the documented shape.
    #[error("{procedure} returned an unexpected result: {message}")]
    MalformedResult {
        procedure: &'static str,
        message: String,
    },

    /// The call could not be made or did not complete.
    #[error("database error: {0}")]
    Database(String),
}

impl RpcError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Database(_))
    }
}

impl From<RpcError> for DomainError {
    fn from(err: RpcError) -> Self {
        let code = match err {
            RpcError::Database(_) => ErrorCode::DatabaseError,
            RpcError::Rejected { .. } | RpcError::MalformedResult { .. } => ErrorCode::RpcFailed,
        };
        DomainError::new(code, err.to_string())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Canonical event processing
// ════════════════════════════════════════════════════════════════════════════════

/// Result of mapping a stored webhook event to a canonical domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessWebhookEventOutput {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub canonical_event: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait CanonicalEventProcessor: Send + Sync {
    /// Maps the stored event and applies its side effects (plan changes,
    /// referral commission, event bus entries).
    async fn process_webhook_event(
        &self,
        event_id: &WebhookEventId,
    ) -> Result<ProcessWebhookEventOutput, RpcError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// System cleanup
// ════════════════════════════════════════════════════════════════════════════════

/// Destructive cleanup request. `confirm` must be set explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CleanupRequest {
    pub scope: String,
    #[serde(default)]
    pub confirm: bool,
}

impl CleanupRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.scope.trim().is_empty() {
            return Err(ValidationError::empty_field("scope"));
        }
        if !self.confirm {
            return Err(ValidationError::invalid_format(
                "confirm",
                "cleanup is destructive and must be confirmed",
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait SystemCleanup: Send + Sync {
    /// Runs the cleanup and returns the procedure's report unchanged.
    async fn run_system_cleanup(&self, request: &CleanupRequest) -> Result<Value, RpcError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Referral purchases
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferralPurchase {
    pub buyer_id: UserId,
    pub order_id: String,
    pub amount_cents: i64,
}

impl ReferralPurchase {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_id.trim().is_empty() {
            return Err(ValidationError::empty_field("order_id"));
        }
        if self.amount_cents < 0 {
            return Err(ValidationError::invalid_format(
                "amount_cents",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub commission_cents: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait ReferralProcessor: Send + Sync {
    async fn process_referral_purchase(
        &self,
        purchase: &ReferralPurchase,
    ) -> Result<ReferralOutcome, RpcError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout links
// ════════════════════════════════════════════════════════════════════════════════

#[async_trait]
pub trait CheckoutLinks: Send + Sync {
    /// Returns the provider checkout URL for `plan`, pre-filled for the user.
    async fn create_checkout_url(&self, user_id: &UserId, plan: Plan) -> Result<String, RpcError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Auto-status schedules
// ════════════════════════════════════════════════════════════════════════════════

#[async_trait]
pub trait AutoStatusScheduler: Send + Sync {
    /// Applies due status schedules. Returns the number of rows updated.
    async fn process_auto_status_schedules(&self) -> Result<i64, RpcError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Role lookup
// ════════════════════════════════════════════════════════════════════════════════

#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn get_user_role(&self, user_id: &UserId) -> Result<UserRole, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_requires_confirmation() {
        let request = CleanupRequest {
            scope: "test_data".into(),
            confirm: false,
        };
        assert!(request.validate().is_err());

        let request = CleanupRequest {
            scope: "test_data".into(),
            confirm: true,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn cleanup_requires_scope() {
        let request = CleanupRequest {
            scope: " ".into(),
            confirm: true,
        };
        assert!(matches!(request.validate(), Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn referral_purchase_rejects_negative_amount() {
        let purchase = ReferralPurchase {
            buyer_id: UserId::new(),
            order_id: "o-1".into(),
            amount_cents: -1,
        };
        assert!(purchase.validate().is_err());
    }

    #[test]
    fn process_output_tolerates_missing_fields() {
        let output: ProcessWebhookEventOutput = serde_json::from_str("{}").unwrap();
        assert!(!output.success);
        assert!(output.canonical_event.is_none());
    }

    #[test]
    fn only_database_failures_are_retryable() {
        assert!(RpcError::Database("down".into()).is_retryable());
        assert!(!RpcError::Rejected {
            procedure: "get_user_role",
            message: "no".into()
        }
        .is_retryable());
    }

    #[test]
    fn rpc_ports_are_object_safe() {
        fn _canonical(_p: &dyn CanonicalEventProcessor) {}
        fn _cleanup(_p: &dyn SystemCleanup) {}
        fn _referral(_p: &dyn ReferralProcessor) {}
        fn _checkout(_p: &dyn CheckoutLinks) {}
        fn _auto(_p: &dyn AutoStatusScheduler) {}
        fn _role(_p: &dyn RoleLookup) {}
    }
}
