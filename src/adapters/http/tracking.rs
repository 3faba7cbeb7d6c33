//! `POST /meta-conversions-api`

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::domain::tracking::ConversionRequest;

use super::error::ApiError;
use super::state::AppState;

pub fn tracking_routes() -> Router<AppState> {
    Router::new().route("/meta-conversions-api", post(forward_conversion))
}

/// The body is parsed by hand so that malformed JSON answers with the same
/// `{error, code}` shape as every other failure.
async fn forward_conversion(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: ConversionRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?;

    let response = state.forward_conversion.handle(request).await?;
    Ok(Json(json!({
        "success": true,
        "response": response,
    })))
}
