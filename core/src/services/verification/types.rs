//! Types for verification service results

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Result of issuing a verification code
#[derive(Clone, Serialize)]
pub struct RequestCodeResult {
    /// Normalized phone number the code was sent to
    pub phone_number: String,
    /// When the issued code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// The SMS message ID from the provider
    pub message_id: String,
    /// The issued code, only populated in diagnostics mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_code: Option<String>,
}

impl fmt::Debug for RequestCodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCodeResult")
            .field("phone_number", &self.phone_number)
            .field("expires_at", &self.expires_at)
            .field("message_id", &self.message_id)
            .field(
                "diagnostic_code",
                &self.diagnostic_code.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Result of a successful confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmResult {
    pub phone_number: String,
    pub verified_at: DateTime<Utc>,
}

/// Outstanding verification for a phone number, without the secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingVerification {
    pub phone_number: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
}
