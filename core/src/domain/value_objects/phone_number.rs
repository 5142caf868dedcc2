//! Normalized phone number used as the verification key.

use pv_shared::utils::phone::{is_e164, mask_phone_number, normalize_phone_number};
use std::fmt;

use crate::errors::VerificationError;

/// A phone number that has been normalized and checked for E.164 shape
///
/// Numbering-plan validity (whether the number is actually assignable) is
/// left to the SMS provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize and validate raw user input
    pub fn parse(raw: &str) -> Result<Self, VerificationError> {
        let normalized = normalize_phone_number(raw);
        if normalized.is_empty() || !is_e164(&normalized) {
            return Err(VerificationError::InvalidPhoneNumber {
                phone: mask_phone_number(raw.trim()),
            });
        }
        Ok(Self(normalized))
    }

    /// The normalized E.164 string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form safe for logs
    pub fn masked(&self) -> String {
        mask_phone_number(&self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
