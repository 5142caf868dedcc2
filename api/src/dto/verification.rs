//! Request and response bodies for the verification endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use pv_core::services::verification::{ConfirmResult, PendingVerification, RequestCodeResult};

/// Body of `POST /request-code`, `POST /cancel` and the `GET /status` query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PhoneRequest {
    /// Phone number in international format, separators allowed
    /// Examples: "+15551234567", "+1 (555) 123-4567"
    #[validate(length(min = 1, max = 32, message = "Phone number is required"))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmRequest {
    #[validate(length(min = 1, max = 32, message = "Phone number is required"))]
    pub phone: String,

    /// Code from the SMS. An empty code is reported as `MISSING_CODE`.
    #[serde(default)]
    #[validate(length(max = 16, message = "Verification code is too long"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCodeResponse {
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
    pub message_id: String,
    /// Present only when the server runs in diagnostics mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RequestCodeResponse {
    /// `ttl_seconds` is the full code lifetime, as the code was just issued
    pub fn from_result(result: RequestCodeResult, ttl_seconds: i64) -> Self {
        Self {
            expires_in_seconds: ttl_seconds,
            phone_number: result.phone_number,
            expires_at: result.expires_at,
            message_id: result.message_id,
            code: result.diagnostic_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub phone_number: String,
    pub verified: bool,
    pub verified_at: DateTime<Utc>,
}

impl From<ConfirmResult> for ConfirmResponse {
    fn from(result: ConfirmResult) -> Self {
        Self {
            phone_number: result.phone_number,
            verified: true,
            verified_at: result.verified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<i64>,
}

impl From<Option<PendingVerification>> for StatusResponse {
    fn from(pending: Option<PendingVerification>) -> Self {
        match pending {
            Some(p) => Self {
                pending: true,
                issued_at: Some(p.issued_at),
                expires_at: Some(p.expires_at),
                expires_in_seconds: Some(p.expires_in_seconds),
            },
            None => Self {
                pending: false,
                issued_at: None,
                expires_at: None,
                expires_in_seconds: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_request_validation() {
        let empty = PhoneRequest { phone: String::new() };
        assert!(empty.validate().is_err());

        let ok = PhoneRequest { phone: "+15551234567".to_string() };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_confirm_request_code_defaults_to_empty() {
        let request: ConfirmRequest =
            serde_json::from_str(r#"{"phone": "+15551234567"}"#).unwrap();
        assert!(request.code.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_status_response_without_pending() {
        let json = serde_json::to_value(StatusResponse::from(None)).unwrap();
        assert_eq!(json, serde_json::json!({ "pending": false }));
    }
}
