//! Expiry sweeper for the in-memory code store
//!
//! Expired records are normally consumed by the next confirmation attempt.
//! Phones that never come back would otherwise keep their record forever, so
//! a background task purges anything expired for longer than the grace
//! period. The grace period keeps recently expired codes around long enough
//! to be reported as expired rather than missing.

use chrono::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pv_core::services::verification::Clock;
use pv_shared::config::VerificationConfig;

use super::memory_store::InMemoryCodeStore;

/// Configuration for the expiry sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep
    pub interval: std::time::Duration,
    /// How long past expiry a record is retained
    pub grace: Duration,
    /// Whether the background task runs at all
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(60),
            grace: Duration::minutes(10),
            enabled: true,
        }
    }
}

impl From<&VerificationConfig> for SweeperConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            interval: std::time::Duration::from_secs(config.sweep_interval_secs.max(1)),
            grace: Duration::seconds(config.sweep_grace_secs.max(0)),
            enabled: config.sweep_interval_secs > 0,
        }
    }
}

/// Result of a sweep cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    /// Number of expired records removed
    pub purged: usize,
    /// Records still held after the sweep
    pub remaining: usize,
}

/// Periodically purges long-expired records from an `InMemoryCodeStore`
pub struct ExpirySweeper {
    store: Arc<InMemoryCodeStore>,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
}

impl ExpirySweeper {
    pub fn new(store: Arc<InMemoryCodeStore>, clock: Arc<dyn Clock>, config: SweeperConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run a single sweep cycle
    pub fn run_sweep(&self) -> SweepResult {
        let purged = self.store.purge_expired(self.clock.now(), self.config.grace);
        let result = SweepResult {
            purged,
            remaining: self.store.len(),
        };

        if purged > 0 {
            info!(
                purged = result.purged,
                remaining = result.remaining,
                event = "otp_sweep",
                "Purged expired verification records"
            );
        } else {
            debug!(remaining = result.remaining, event = "otp_sweep", "Nothing to purge");
        }

        result
    }

    /// Start the sweeper as a background task
    ///
    /// Returns `None` when the sweeper is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Verification record sweeper is disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            info!(
                interval_secs = self.config.interval.as_secs(),
                grace_secs = self.config.grace.num_seconds(),
                "Verification record sweeper started"
            );

            let mut interval_timer = tokio::time::interval(self.config.interval);
            loop {
                interval_timer.tick().await;
                self.run_sweep();
            }
        }))
    }
}
