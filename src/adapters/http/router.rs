//! Top-level router assembly.
//!
//! ```text
//! /health, /webhook-*, /meta-conversions-api     no bearer token
//! /jobs/*, /chat/*, /checkout-url, /admin/*      auth_middleware
//! ```

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::admin::admin_routes;
use super::chat::chat_routes;
use super::checkout::checkout_routes;
use super::health::health_routes;
use super::jobs::job_routes;
use super::middleware::auth_middleware;
use super::state::AppState;
use super::tracking::tracking_routes;
use super::webhooks::webhook_routes;

/// Builds the complete API.
///
/// `cors_origins` lists exact origins allowed for browser calls; an empty
/// list disables cross-origin access.
pub fn api_router(state: AppState, cors_origins: &[String], timeout: Duration) -> Router {
    let authenticated = Router::new()
        .merge(job_routes())
        .merge(chat_routes())
        .merge(checkout_routes())
        .merge(admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.session_validator.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health_routes())
        .merge(webhook_routes())
        .merge(tracking_routes())
        .merge(authenticated)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(cors_origins))
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}
