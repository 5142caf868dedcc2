//! Configuration for the verification service

use std::time::Duration as StdDuration;

use chrono::Duration;
use pv_shared::config::VerificationConfig;

use crate::domain::entities::DEFAULT_TTL_MINUTES;

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Number of minutes before a verification code expires
    pub code_ttl_minutes: i64,
    /// Return the issued code to the caller (never enabled in production)
    pub diagnostics_mode: bool,
    /// Upper bound on a single gateway call; `None` waits indefinitely
    pub delivery_timeout: Option<StdDuration>,
}

impl VerificationServiceConfig {
    pub fn code_ttl(&self) -> Duration {
        Duration::minutes(self.code_ttl_minutes)
    }
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: DEFAULT_TTL_MINUTES,
            diagnostics_mode: false,
            delivery_timeout: Some(StdDuration::from_secs(30)),
        }
    }
}

impl From<&VerificationConfig> for VerificationServiceConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            code_ttl_minutes: config.code_ttl_minutes,
            diagnostics_mode: config.diagnostics_mode,
            delivery_timeout: (config.delivery_timeout_secs > 0)
                .then(|| StdDuration::from_secs(config.delivery_timeout_secs)),
        }
    }
}
