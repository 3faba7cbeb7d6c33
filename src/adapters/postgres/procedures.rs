//! Database function calls behind the RPC collaborator ports.
//!
//! A procedure that raises is reported as `RpcError::Rejected` with the
//! database message; a connection or pool failure is `RpcError::Database`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::billing::Plan;
use crate::domain::foundation::{UserId, UserRole, WebhookEventId};
use crate::ports::{
    AutoStatusScheduler, CanonicalEventProcessor, CheckoutLinks, CleanupRequest,
    ProcessWebhookEventOutput, ReferralOutcome, ReferralProcessor, ReferralPurchase, RoleLookup,
    RpcError, SystemCleanup,
};

const PROCESS_WEBHOOK_EVENT: &str = "process_webhook_event";
const RUN_SYSTEM_CLEANUP: &str = "run_system_cleanup";
const PROCESS_REFERRAL_PURCHASE: &str = "process_referral_purchase";
const CREATE_CHECKOUT_URL: &str = "create_checkout_url";
const PROCESS_AUTO_STATUS_SCHEDULES: &str = "process_auto_status_schedules";
const GET_USER_ROLE: &str = "get_user_role";

/// Calls the database functions that own the business rules.
#[derive(Clone)]
pub struct PostgresProcedures {
    pool: PgPool,
}

impl PostgresProcedures {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn call_error(procedure: &'static str, err: sqlx::Error) -> RpcError {
    match err {
        sqlx::Error::Database(db_err) => RpcError::Rejected {
            procedure,
            message: db_err.message().to_string(),
        },
        other => RpcError::Database(format!("{}: {}", procedure, other)),
    }
}

fn decode<T: DeserializeOwned>(procedure: &'static str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::MalformedResult {
        procedure,
        message: e.to_string(),
    })
}

fn missing(procedure: &'static str) -> RpcError {
    RpcError::MalformedResult {
        procedure,
        message: "returned NULL".to_string(),
    }
}

#[async_trait]
impl CanonicalEventProcessor for PostgresProcedures {
    async fn process_webhook_event(
        &self,
        event_id: &WebhookEventId,
    ) -> Result<ProcessWebhookEventOutput, RpcError> {
        let result: Option<Value> =
            sqlx::query_scalar("SELECT process_webhook_event(p_event_id => $1)")
                .bind(event_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| call_error(PROCESS_WEBHOOK_EVENT, e))?;

        decode(
            PROCESS_WEBHOOK_EVENT,
            result.ok_or_else(|| missing(PROCESS_WEBHOOK_EVENT))?,
        )
    }
}

#[async_trait]
impl SystemCleanup for PostgresProcedures {
    async fn run_system_cleanup(&self, request: &CleanupRequest) -> Result<Value, RpcError> {
        let result: Option<Value> =
            sqlx::query_scalar("SELECT run_system_cleanup(p_scope => $1)")
                .bind(&request.scope)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| call_error(RUN_SYSTEM_CLEANUP, e))?;

        Ok(result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ReferralProcessor for PostgresProcedures {
    async fn process_referral_purchase(
        &self,
        purchase: &ReferralPurchase,
    ) -> Result<ReferralOutcome, RpcError> {
        let result: Option<Value> = sqlx::query_scalar(
            "SELECT process_referral_purchase(p_buyer_id => $1, p_order_id => $2, p_amount_cents => $3)",
        )
        .bind(purchase.buyer_id.as_uuid())
        .bind(&purchase.order_id)
        .bind(purchase.amount_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| call_error(PROCESS_REFERRAL_PURCHASE, e))?;

        decode(
            PROCESS_REFERRAL_PURCHASE,
            result.ok_or_else(|| missing(PROCESS_REFERRAL_PURCHASE))?,
        )
    }
}

#[async_trait]
impl CheckoutLinks for PostgresProcedures {
    async fn create_checkout_url(&self, user_id: &UserId, plan: Plan) -> Result<String, RpcError> {
        let url: Option<String> =
            sqlx::query_scalar("SELECT create_checkout_url(p_user_id => $1, p_plan => $2)")
                .bind(user_id.as_uuid())
                .bind(plan.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| call_error(CREATE_CHECKOUT_URL, e))?;

        url.filter(|u| !u.is_empty())
            .ok_or_else(|| missing(CREATE_CHECKOUT_URL))
    }
}

#[async_trait]
impl AutoStatusScheduler for PostgresProcedures {
    async fn process_auto_status_schedules(&self) -> Result<i64, RpcError> {
        let updated: Option<i32> = sqlx::query_scalar("SELECT process_auto_status_schedules()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| call_error(PROCESS_AUTO_STATUS_SCHEDULES, e))?;

        Ok(updated.map(i64::from).unwrap_or(0))
    }
}

#[async_trait]
impl RoleLookup for PostgresProcedures {
    async fn get_user_role(&self, user_id: &UserId) -> Result<UserRole, RpcError> {
        let role: Option<String> = sqlx::query_scalar("SELECT get_user_role(p_user_id => $1)")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| call_error(GET_USER_ROLE, e))?;

        Ok(role
            .as_deref()
            .map(UserRole::parse_lenient)
            .unwrap_or(UserRole::User))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_output_names_the_procedure() {
        let err = decode::<ReferralOutcome>(PROCESS_REFERRAL_PURCHASE, Value::from(42))
            .unwrap_err();
        assert!(matches!(
            err,
            RpcError::MalformedResult { procedure: "process_referral_purchase", .. }
        ));
    }

    #[test]
    fn pool_failures_are_retryable() {
        let err = call_error(GET_USER_ROLE, sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
    }
}
