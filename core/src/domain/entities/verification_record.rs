//! Pending verification record for SMS-based phone ownership checks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Default lifetime of a verification code (10 minutes)
pub const DEFAULT_TTL_MINUTES: i64 = 10;

/// A code issued to a phone number and waiting for confirmation
///
/// Records are immutable: a new issuance replaces the stored record instead of
/// editing it. The `code` field is the secret and is redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Identifier of this issuance
    pub id: Uuid,

    /// Normalized E.164 phone number the code was issued for
    pub phone_number: String,

    /// The 6-digit verification code
    pub code: String,

    /// When the code was issued
    pub issued_at: DateTime<Utc>,

    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Creates a record issued at `issued_at` that lives for `ttl`
    pub fn issue(
        phone_number: impl Into<String>,
        code: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number: phone_number.into(),
            code: code.into(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    /// Whether the record is past its expiry at `now`
    ///
    /// A code is still accepted at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry at `now`, or zero once expired
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

impl fmt::Debug for VerificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRecord")
            .field("id", &self.id)
            .field("phone_number", &self.phone_number)
            .field("code", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
