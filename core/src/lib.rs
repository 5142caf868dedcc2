//! # Phone Verification Core
//!
//! Domain layer for the phone verification service: the verification record,
//! the typed error set and the service that issues and confirms one-time
//! codes. Storage and SMS delivery are abstract traits implemented by
//! `pv_infra`.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
