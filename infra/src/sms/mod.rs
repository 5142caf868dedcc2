//! SMS gateway implementations
//!
//! - **Mock**: logs a masked destination and keeps the last message per
//!   phone for local inspection
//! - **Twilio**: production delivery through the Twilio Messages API

pub mod mock_sms;
pub mod twilio;

pub use mock_sms::MockSmsGateway;
pub use twilio::{TwilioConfig, TwilioSmsGateway};

use std::sync::Arc;

use pv_core::services::verification::SmsGateway;
use pv_shared::config::{SmsConfig, SmsProvider};

use crate::InfrastructureError;

/// Create the SMS gateway selected by `config`
pub fn create_sms_gateway(config: &SmsConfig) -> Result<Arc<dyn SmsGateway>, InfrastructureError> {
    match config.provider {
        SmsProvider::Mock => {
            tracing::info!(provider = "mock", "Using mock SMS gateway");
            Ok(Arc::new(MockSmsGateway::new()))
        }
        SmsProvider::Twilio => {
            let twilio = TwilioSmsGateway::new(TwilioConfig::try_from(config)?)?;
            Ok(Arc::new(twilio))
        }
    }
}
