//! Twilio SMS gateway
//!
//! Sends messages through the Twilio Messages REST API with a form-encoded
//! POST authenticated by the account SID and auth token.
//!
//! ## Retry policy
//!
//! - 429 and 5xx responses are retried with exponential backoff
//! - transport errors (connect failures, timeouts) are retried the same way
//! - any other 4xx response fails immediately

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use pv_core::services::verification::SmsGateway;
use pv_shared::config::SmsConfig;
use pv_shared::utils::phone::{is_e164, mask_phone_number};

use crate::InfrastructureError;

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Twilio rejects bodies longer than this
const MAX_MESSAGE_LENGTH: usize = 1600;

/// Twilio gateway configuration
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    pub auth_token: String,
    /// From phone number (must be a Twilio phone number)
    pub from_number: String,
    /// Maximum send attempts per message
    pub max_retries: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Timeout for API requests in seconds
    pub request_timeout_secs: u64,
    /// API origin, overridable for tests
    pub api_base: String,
}

impl TryFrom<&SmsConfig> for TwilioConfig {
    type Error = InfrastructureError;

    fn try_from(config: &SmsConfig) -> Result<Self, Self::Error> {
        if config.account_sid.is_empty() || config.auth_token.is_empty() {
            return Err(InfrastructureError::Config(
                "Twilio account_sid and auth_token are required".to_string(),
            ));
        }
        if !is_e164(&config.from_number) {
            return Err(InfrastructureError::Config(
                "Twilio from_number must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        Ok(Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay_ms: config.retry_delay_ms,
            request_timeout_secs: config.request_timeout_secs,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

/// Outcome of a single send attempt
enum AttemptError {
    Retryable(String),
    Fatal(String),
}

/// Twilio SMS gateway implementation
pub struct TwilioSmsGateway {
    client: Client,
    config: TwilioConfig,
}

impl TwilioSmsGateway {
    pub fn new(config: TwilioConfig) -> Result<Self, InfrastructureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        info!(
            from = %mask_phone_number(&config.from_number),
            "Twilio SMS gateway initialized"
        );

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    async fn send_once(&self, to: &str, message: &str) -> Result<String, AttemptError> {
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", message),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let body: MessageResponse = response
                .json()
                .await
                .map_err(|e| AttemptError::Fatal(format!("unreadable response: {}", e)))?;
            debug!(sid = %body.sid, status = ?body.status, "Twilio accepted message");
            return Ok(body.sid);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let reason = format!("Twilio returned {}: {}", status, error_text);

        if is_retryable_status(status) {
            Err(AttemptError::Retryable(reason))
        } else {
            Err(AttemptError::Fatal(reason))
        }
    }

    /// Send SMS with retry logic
    async fn send_with_retry(&self, to: &str, message: &str) -> Result<String, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);

        loop {
            attempts += 1;

            match self.send_once(to, message).await {
                Ok(sid) => {
                    info!(
                        phone = %mask_phone_number(to),
                        sid = %sid,
                        attempts = attempts,
                        "SMS sent via Twilio"
                    );
                    return Ok(sid);
                }
                Err(AttemptError::Fatal(reason)) => {
                    error!(phone = %mask_phone_number(to), reason = %reason, "Twilio rejected SMS");
                    return Err(InfrastructureError::Sms(reason));
                }
                Err(AttemptError::Retryable(reason)) if attempts >= self.config.max_retries => {
                    error!(
                        phone = %mask_phone_number(to),
                        attempts = attempts,
                        reason = %reason,
                        "Giving up on SMS delivery"
                    );
                    return Err(InfrastructureError::Sms(format!(
                        "Failed to send SMS after {} attempts: {}",
                        attempts, reason
                    )));
                }
                Err(AttemptError::Retryable(reason)) => {
                    warn!(
                        "Failed to send SMS (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.config.max_retries, reason, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl SmsGateway for TwilioSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<String, String> {
        if !is_e164(phone) {
            return Err(format!(
                "Invalid phone number format: {}",
                mask_phone_number(phone)
            ));
        }
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(format!(
                "Message exceeds maximum length of {} characters",
                MAX_MESSAGE_LENGTH
            ));
        }

        self.send_with_retry(phone, message)
            .await
            .map_err(|e| e.to_string())
    }

    fn provider_name(&self) -> &str {
        "twilio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

    fn sms_config() -> SmsConfig {
        SmsConfig {
            provider: pv_shared::config::SmsProvider::Twilio,
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15005550006".to_string(),
            max_retries: 3,
            retry_delay_ms: 1,
            request_timeout_secs: 5,
        }
    }

    fn gateway_for(server: &MockServer) -> TwilioSmsGateway {
        let mut config = TwilioConfig::try_from(&sms_config()).unwrap();
        config.api_base = server.uri();
        TwilioSmsGateway::new(config).unwrap()
    }

    #[test]
    fn test_config_requires_e164_sender() {
        let config = SmsConfig {
            from_number: "15005550006".to_string(),
            ..sms_config()
        };
        let err = TwilioConfig::try_from(&config).unwrap_err();
        assert!(err.to_string().contains("E.164"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(header_exists("authorization"))
            .and(body_string_contains("Body=Your+code+is+048213"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"sid": "SM42", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let sid = gateway.send("+15551234567", "Your code is 048213").await.unwrap();
        assert_eq!(sid, "SM42");
    }

    #[tokio::test]
    async fn test_retries_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "SM43"})))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        assert_eq!(gateway.send("+15551234567", "hello").await.unwrap(), "SM43");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let err = gateway.send("+15551234567", "hello").await.unwrap_err();
        assert!(err.contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid To number"))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let err = gateway.send("+15551234567", "hello").await.unwrap_err();
        assert!(err.contains("invalid To number"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_destination_without_calling_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        assert!(gateway.send("5551234567", "hello").await.is_err());
        assert!(gateway
            .send("+15551234567", &"x".repeat(MAX_MESSAGE_LENGTH + 1))
            .await
            .is_err());
    }
}
