//! `POST /checkout-url`

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::domain::billing::Plan;

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: Plan,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/checkout-url", post(create_checkout_url))
}

async fn create_checkout_url(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let url = state.checkout.handle(&user.id, request.plan).await?;
    Ok(Json(CheckoutResponse { url }))
}
