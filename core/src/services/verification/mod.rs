//! Verification service module for SMS-based phone ownership checks
//!
//! This module provides the one-time code workflow:
//! - Secure code generation and SMS delivery
//! - Confirmation with expiry and single-use consumption
//! - Status lookup and cancellation of pending codes

mod clock;
mod config;
mod generator;
mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::VerificationServiceConfig;
pub use generator::{CodeGenerator, OsRngCodeGenerator};
pub use service::{verification_message, VerificationService};
pub use traits::{CodeStore, SmsGateway};
pub use types::{ConfirmResult, PendingVerification, RequestCodeResult};
