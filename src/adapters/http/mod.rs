//! HTTP adapter - the axum surface of the service.
//!
//! Each area has its own route module; `router` assembles them with the
//! auth middleware and the tower-http layers.

mod admin;
mod chat;
mod checkout;
mod error;
mod health;
mod jobs;
pub mod middleware;
mod router;
mod state;
mod tracking;
mod webhooks;

pub use error::ApiError;
pub use router::api_router;
pub use state::{AppOptions, AppPorts, AppState};
