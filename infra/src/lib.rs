//! # Infrastructure Layer
//!
//! Concrete implementations of the ports declared in `pv_core`:
//!
//! - **Cache**: in-memory and Redis-backed `CodeStore` implementations, plus
//!   the expiry sweeper for the in-memory backend
//! - **SMS**: `SmsGateway` implementations (mock for development, Twilio for
//!   production)
//!
//! The `build_code_store` and `create_sms_gateway` functions turn the shared
//! application configuration into ready-to-use trait objects.

use std::sync::Arc;

use pv_core::services::verification::{Clock, CodeStore};
use pv_shared::config::{StoreBackend, StoreConfig, VerificationConfig};

/// Cache module - code store backends and the Redis client
pub mod cache;

/// SMS module - outbound SMS providers
pub mod sms;

pub use cache::{ExpirySweeper, InMemoryCodeStore, RedisClient, RedisCodeStore, SweeperConfig};
pub use sms::{create_sms_gateway, MockSmsGateway, TwilioConfig, TwilioSmsGateway};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stored payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS service error
    #[error("SMS service error: {0}")]
    Sms(String),
}

/// A constructed code store together with the sweeper that bounds it, if any
pub struct CodeStoreHandle {
    pub store: Arc<dyn CodeStore>,
    pub sweeper: Option<Arc<ExpirySweeper>>,
}

/// Build the code store selected by `store_config`
///
/// The in-memory backend comes with an expiry sweeper (not yet started);
/// Redis bounds itself through key TTLs.
pub async fn build_code_store(
    store_config: &StoreConfig,
    verification: &VerificationConfig,
    clock: Arc<dyn Clock>,
) -> Result<CodeStoreHandle, InfrastructureError> {
    match store_config.backend {
        StoreBackend::Memory => {
            tracing::info!(backend = "memory", "Using in-memory verification store");
            let store = Arc::new(InMemoryCodeStore::new());
            let sweeper = Arc::new(ExpirySweeper::new(
                store.clone(),
                clock,
                SweeperConfig::from(verification),
            ));
            Ok(CodeStoreHandle {
                store,
                sweeper: Some(sweeper),
            })
        }
        StoreBackend::Redis => {
            tracing::info!(backend = "redis", "Using Redis verification store");
            let client = RedisClient::new(store_config).await?;
            let store = RedisCodeStore::new(
                client,
                store_config.clone(),
                clock,
                verification.sweep_grace_secs,
            );
            Ok(CodeStoreHandle {
                store: Arc::new(store),
                sweeper: None,
            })
        }
    }
}
