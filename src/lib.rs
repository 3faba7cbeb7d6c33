//! Membergate - membership platform backend services.
//!
//! - Receives payment provider webhooks idempotently and hands them to the
//!   canonical event processor
//! - Fans domain events out to third-party webhook subscribers
//! - Forwards conversion events to the ad platform's server-side API
//! - Resolves and streams chat restrictions
//!
//! The crate follows a ports-and-adapters layout: `domain` holds the rules,
//! `ports` the traits, `application` the handlers and `adapters` the
//! Postgres, HTTP and in-memory implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
