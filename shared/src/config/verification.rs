//! Verification policy configuration

use serde::{Deserialize, Serialize};

/// Settings that govern code issuance and confirmation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Minutes a code stays valid after issuance
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,

    /// Return the generated code in the request-code response.
    /// Never enable outside of development and automated tests.
    #[serde(default)]
    pub diagnostics_mode: bool,

    /// Upper bound for a single SMS delivery call in seconds (0 = unbounded)
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,

    /// How often the in-memory store sweeps expired records in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// How long an expired record is retained so that it can still be
    /// reported as expired before the sweeper drops it
    #[serde(default = "default_sweep_grace_secs")]
    pub sweep_grace_secs: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: default_code_ttl_minutes(),
            diagnostics_mode: false,
            delivery_timeout_secs: default_delivery_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_grace_secs: default_sweep_grace_secs(),
        }
    }
}

fn default_code_ttl_minutes() -> i64 {
    10
}

fn default_delivery_timeout_secs() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_sweep_grace_secs() -> i64 {
    600
}
