//! Administrative endpoints under `/admin`.
//!
//! Endpoint, subscriber, cleanup and referral routes require the admin role.
//! Chat moderation routes accept moderators too; the moderation handler
//! checks the role itself.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;

use crate::application::handlers::chat::{RestrictUserCommand, SetGlobalBlockCommand};
use crate::application::handlers::outbound::CreateSubscriptionCommand;
use crate::application::handlers::webhook::CreateWebhookEndpointCommand;
use crate::domain::chat::UserChatRestriction;
use crate::domain::foundation::{OutboundSubscriptionId, WebhookEndpointId};
use crate::domain::outbound::OutboundSubscriptionSummary;
use crate::domain::webhook::{Provider, WebhookEndpointSummary};
use crate::ports::{CleanupRequest, ReferralOutcome, ReferralPurchase};

use super::error::ApiError;
use super::middleware::{RequireAdmin, RequireAuth};
use super::state::AppState;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct CreateWebhookEndpointRequest {
    pub provider: Provider,
    pub url: String,
    pub secret: SecretString,
    #[serde(default)]
    pub require_signature: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub name: String,
    pub target_url: String,
    #[serde(default)]
    pub secret: Option<SecretString>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Routes
// ════════════════════════════════════════════════════════════════════════════════

/// - `POST /admin/webhook-endpoints`
/// - `POST /admin/webhook-endpoints/:id/deactivate`
/// - `POST /admin/outbound-subscriptions`
/// - `POST /admin/outbound-subscriptions/:id/deactivate`
/// - `POST /admin/chat/restrictions`
/// - `PUT|DELETE /admin/chat/global-block`
/// - `POST /admin/system-cleanup`
/// - `POST /admin/referrals/process`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/webhook-endpoints", post(create_webhook_endpoint))
        .route(
            "/admin/webhook-endpoints/:id/deactivate",
            post(deactivate_webhook_endpoint),
        )
        .route("/admin/outbound-subscriptions", post(create_subscription))
        .route(
            "/admin/outbound-subscriptions/:id/deactivate",
            post(deactivate_subscription),
        )
        .route("/admin/chat/restrictions", post(restrict_user))
        .route(
            "/admin/chat/global-block",
            put(set_global_block).delete(clear_global_block),
        )
        .route("/admin/system-cleanup", post(system_cleanup))
        .route("/admin/referrals/process", post(process_referral))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook endpoints
// ════════════════════════════════════════════════════════════════════════════════

async fn create_webhook_endpoint(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(request): Json<CreateWebhookEndpointRequest>,
) -> Result<(StatusCode, Json<WebhookEndpointSummary>), ApiError> {
    let summary = state
        .webhook_endpoints
        .create(CreateWebhookEndpointCommand {
            provider: request.provider,
            url: request.url,
            secret: request.secret,
            require_signature: request.require_signature,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn deactivate_webhook_endpoint(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<WebhookEndpointId>,
) -> Result<StatusCode, ApiError> {
    state.webhook_endpoints.deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Outbound subscriptions
// ════════════════════════════════════════════════════════════════════════════════

async fn create_subscription(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<OutboundSubscriptionSummary>), ApiError> {
    let summary = state
        .subscriptions
        .create(CreateSubscriptionCommand {
            name: request.name,
            target_url: request.target_url,
            secret: request.secret,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn deactivate_subscription(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<OutboundSubscriptionId>,
) -> Result<StatusCode, ApiError> {
    state.subscriptions.deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Chat moderation
// ════════════════════════════════════════════════════════════════════════════════

async fn restrict_user(
    State(state): State<AppState>,
    RequireAuth(moderator): RequireAuth,
    Json(cmd): Json<RestrictUserCommand>,
) -> Result<(StatusCode, Json<UserChatRestriction>), ApiError> {
    let restriction = state.moderation.restrict_user(&moderator.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(restriction)))
}

async fn set_global_block(
    State(state): State<AppState>,
    RequireAuth(moderator): RequireAuth,
    Json(cmd): Json<SetGlobalBlockCommand>,
) -> Result<StatusCode, ApiError> {
    state.moderation.set_global_block(&moderator.id, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_global_block(
    State(state): State<AppState>,
    RequireAuth(moderator): RequireAuth,
) -> Result<StatusCode, ApiError> {
    state.moderation.clear_global_block(&moderator.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Procedures
// ════════════════════════════════════════════════════════════════════════════════

async fn system_cleanup(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CleanupRequest>,
) -> Result<Json<Value>, ApiError> {
    let report = state.cleanup.handle(&admin.id, request).await?;
    Ok(Json(report))
}

async fn process_referral(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(purchase): Json<ReferralPurchase>,
) -> Result<Json<ReferralOutcome>, ApiError> {
    let outcome = state.referrals.handle(purchase).await?;
    Ok(Json(outcome))
}
