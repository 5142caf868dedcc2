//! Mock SMS gateway
//!
//! Development and test stand-in for a real provider. Messages are not sent
//! anywhere: the destination is logged in masked form and the message body is
//! kept in memory so it can be inspected locally.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use pv_core::services::verification::SmsGateway;
use pv_shared::utils::phone::{is_e164, mask_phone_number};

/// Mock SMS gateway for development and testing
#[derive(Debug, Default)]
pub struct MockSmsGateway {
    /// Counter for tracking number of messages sent
    message_count: AtomicU64,
    /// Whether to simulate failures
    simulate_failure: AtomicBool,
    /// Artificial latency added to each send
    latency: Option<Duration>,
    /// Last message body per destination
    last_messages: DashMap<String, String>,
}

impl MockSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixed delay to every send, e.g. to exercise delivery timeouts
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Get the total number of messages sent
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Enable or disable failure simulation
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    /// The last message delivered to `phone`
    pub fn last_message(&self, phone: &str) -> Option<String> {
        self.last_messages.get(phone).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl SmsGateway for MockSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<String, String> {
        let masked_phone = mask_phone_number(phone);

        if !is_e164(phone) {
            return Err(format!("Invalid phone number format: {}", masked_phone));
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(provider = "mock", phone = %masked_phone, "Mock SMS gateway simulating failure");
            return Err("Simulated SMS sending failure".to_string());
        }

        let message_id = format!("mock_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_messages.insert(phone.to_string(), message.to_string());

        info!(
            target: "sms_service",
            provider = "mock",
            phone = %masked_phone,
            message_id = %message_id,
            message_length = message.len(),
            message_number = count,
            "SMS sent successfully (mock)"
        );

        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
