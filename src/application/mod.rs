//! Application layer - Command and query handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers receive their ports as `Arc<dyn Trait>` at construction and hold
//! no other state.

pub mod handlers;
