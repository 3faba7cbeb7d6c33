//! Provider webhook receivers.
//!
//! Providers authenticate with secrets or signatures, never with bearer
//! tokens, so these routes sit outside the auth middleware.

use std::collections::{BTreeMap, HashMap};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::application::handlers::webhook::{ReceiveWebhookCommand, ReceiveWebhookResult};
use crate::domain::webhook::Provider;

use super::error::ApiError;
use super::state::AppState;

/// - `POST /webhook-hotmart`
/// - `POST /webhook-kiwify`
/// - `POST /webhook-generic`
/// - `POST /webhook-caktor`
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook-hotmart", post(hotmart))
        .route("/webhook-kiwify", post(kiwify))
        .route("/webhook-generic", post(generic))
        .route("/webhook-caktor", post(caktor))
}

async fn hotmart(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, Provider::Hotmart, query, headers, body).await
}

async fn kiwify(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, Provider::Kiwify, query, headers, body).await
}

async fn generic(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, Provider::Generic, query, headers, body).await
}

async fn caktor(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, Provider::Caktor, query, headers, body).await
}

async fn receive(
    state: AppState,
    provider: Provider,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cmd = ReceiveWebhookCommand {
        provider,
        body: body.to_vec(),
        headers: capture_headers(&headers),
        query,
    };

    let response = match state.receive_webhook.handle(cmd).await? {
        ReceiveWebhookResult::Accepted {
            event_id,
            processed,
        } => json!({
            "success": true,
            "event_id": event_id,
            "processed": processed,
        }),
        ReceiveWebhookResult::Duplicate { event_id } => {
            let mut body = json!({
                "success": true,
                "duplicate": true,
                "message": "Event already processed",
            });
            if let Some(id) = event_id {
                body["event_id"] = json!(id);
            }
            body
        }
    };
    Ok(Json(response))
}

/// Header names arrive lower-cased from `http`; values that are not valid
/// UTF-8 are dropped.
fn capture_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
