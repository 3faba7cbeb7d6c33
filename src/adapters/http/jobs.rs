//! Scheduler-triggered jobs. Callers must present a `service_role` token.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::error::ApiError;
use super::middleware::RequireService;
use super::state::AppState;

/// - `POST /jobs/outbound-dispatch` - one dispatcher pass
/// - `POST /jobs/auto-status` - process due status schedules
pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/outbound-dispatch", post(outbound_dispatch))
        .route("/jobs/auto-status", post(auto_status))
}

async fn outbound_dispatch(
    State(state): State<AppState>,
    RequireService(_): RequireService,
) -> Result<Json<Value>, ApiError> {
    let report = state.dispatch.dispatch_once().await?;
    Ok(Json(json!({
        "success": true,
        "processed": report.processed,
        "deliveries": report.deliveries,
        "failed_deliveries": report.failed_deliveries,
    })))
}

async fn auto_status(
    State(state): State<AppState>,
    RequireService(_): RequireService,
) -> Result<Json<Value>, ApiError> {
    let updated = state.auto_status.handle().await?;
    Ok(Json(json!({
        "success": true,
        "updated": updated,
    })))
}
