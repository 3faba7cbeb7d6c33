//! Stub procedure collaborators for development and tests.
//!
//! The real procedures live in the database; these stand-ins record what they
//! were asked and return configured results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::billing::Plan;
use crate::domain::foundation::{UserId, UserRole, WebhookEventId};
use crate::ports::{
    AutoStatusScheduler, CanonicalEventProcessor, CheckoutLinks, CleanupRequest,
    ProcessWebhookEventOutput, ReferralOutcome, ReferralProcessor, ReferralPurchase, RoleLookup,
    RpcError, SystemCleanup,
};

/// Role table with a default of [`UserRole::User`].
#[derive(Debug, Default)]
pub struct InMemoryRoles {
    roles: RwLock<HashMap<UserId, UserRole>>,
    failure: RwLock<Option<RpcError>>,
    calls: AtomicUsize,
}

impl InMemoryRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(self, user_id: UserId, role: UserRole) -> Self {
        self.set_role(user_id, role);
        self
    }

    pub fn set_role(&self, user_id: UserId, role: UserRole) {
        if let Ok(mut roles) = self.roles.write() {
            roles.insert(user_id, role);
        }
    }

    /// Makes every lookup fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<RpcError>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = error;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleLookup for InMemoryRoles {
    async fn get_user_role(&self, user_id: &UserId) -> Result<UserRole, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.read().ok().and_then(|f| f.clone()) {
            return Err(error);
        }
        Ok(self
            .roles
            .read()
            .ok()
            .and_then(|roles| roles.get(user_id).copied())
            .unwrap_or(UserRole::User))
    }
}

/// Canonical processor that remembers which events it was handed.
#[derive(Debug)]
pub struct RecordingCanonicalProcessor {
    outcome: Result<ProcessWebhookEventOutput, RpcError>,
    processed: RwLock<Vec<WebhookEventId>>,
}

impl Default for RecordingCanonicalProcessor {
    fn default() -> Self {
        Self::succeeding("purchase.approved")
    }
}

impl RecordingCanonicalProcessor {
    pub fn succeeding(canonical_event: impl Into<String>) -> Self {
        Self {
            outcome: Ok(ProcessWebhookEventOutput {
                success: true,
                canonical_event: Some(canonical_event.into()),
                message: None,
            }),
            processed: RwLock::new(Vec::new()),
        }
    }

    pub fn failing(error: RpcError) -> Self {
        Self {
            outcome: Err(error),
            processed: RwLock::new(Vec::new()),
        }
    }

    pub fn processed(&self) -> Vec<WebhookEventId> {
        self.processed.read().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CanonicalEventProcessor for RecordingCanonicalProcessor {
    async fn process_webhook_event(
        &self,
        event_id: &WebhookEventId,
    ) -> Result<ProcessWebhookEventOutput, RpcError> {
        if let Ok(mut processed) = self.processed.write() {
            processed.push(*event_id);
        }
        self.outcome.clone()
    }
}

/// Canned answers for the administrative procedures.
#[derive(Debug, Default)]
pub struct StubProcedures {
    auto_status_updates: i64,
    calls: AtomicUsize,
}

impl StubProcedures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows `process_auto_status_schedules` reports.
    pub fn with_auto_status_updates(mut self, updated: i64) -> Self {
        self.auto_status_updates = updated;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SystemCleanup for StubProcedures {
    async fn run_system_cleanup(&self, request: &CleanupRequest) -> Result<Value, RpcError> {
        self.count();
        Ok(json!({ "success": true, "scope": request.scope, "deleted": 0 }))
    }
}

#[async_trait]
impl ReferralProcessor for StubProcedures {
    async fn process_referral_purchase(
        &self,
        purchase: &ReferralPurchase,
    ) -> Result<ReferralOutcome, RpcError> {
        self.count();
        Ok(ReferralOutcome {
            success: true,
            commission_cents: Some(purchase.amount_cents / 10),
            message: None,
        })
    }
}

#[async_trait]
impl CheckoutLinks for StubProcedures {
    async fn create_checkout_url(&self, user_id: &UserId, plan: Plan) -> Result<String, RpcError> {
        self.count();
        Ok(format!(
            "https://checkout.example.test/{}?ref={}",
            plan.as_str(),
            user_id
        ))
    }
}

#[async_trait]
impl AutoStatusScheduler for StubProcedures {
    async fn process_auto_status_schedules(&self) -> Result<i64, RpcError> {
        self.count();
        Ok(self.auto_status_updates)
    }
}
