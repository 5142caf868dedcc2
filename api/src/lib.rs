//! HTTP binding for the phone verification service
//!
//! Exposes the verification operations over actix-web. The binary in
//! `main.rs` wires configuration, telemetry and the infrastructure backends
//! together; everything here is reusable from integration tests.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use app::{create_app, AppState, PhoneVerifier};
