//! Domain-specific error types and error handling.

use thiserror::Error;

/// Failures surfaced by the verification service
///
/// Every variant is returned to the immediate caller; none of them is fatal
/// to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid phone number format: {phone}")]
    InvalidPhoneNumber { phone: String },

    #[error("Verification code is required")]
    MissingCode,

    #[error("Failed to deliver verification code: {reason}")]
    DeliveryFailed { reason: String },

    #[error("No pending verification for this phone number")]
    NoPendingVerification,

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Verification code does not match")]
    CodeMismatch,

    #[error("Secure random source unavailable: {reason}")]
    EntropyUnavailable { reason: String },

    #[error("Verification store unavailable: {message}")]
    StoreUnavailable { message: String },
}

/// Discriminant of [`VerificationError`] without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPhoneNumber,
    MissingCode,
    DeliveryFailed,
    NoPendingVerification,
    CodeExpired,
    CodeMismatch,
    EntropyUnavailable,
    StoreUnavailable,
}

impl ErrorKind {
    /// Stable machine-readable code for wire formats
    pub fn as_code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            ErrorKind::MissingCode => "MISSING_CODE",
            ErrorKind::DeliveryFailed => "DELIVERY_FAILED",
            ErrorKind::NoPendingVerification => "NO_PENDING_VERIFICATION",
            ErrorKind::CodeExpired => "CODE_EXPIRED",
            ErrorKind::CodeMismatch => "CODE_MISMATCH",
            ErrorKind::EntropyUnavailable => "ENTROPY_UNAVAILABLE",
            ErrorKind::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }

    /// Whether the caller can act on the error without operator help
    ///
    /// `CodeMismatch` means try again, `DeliveryFailed` means retry delivery,
    /// `CodeExpired`/`NoPendingVerification` mean request a new code.
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(self, ErrorKind::EntropyUnavailable | ErrorKind::StoreUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl VerificationError {
    /// The payload-free kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerificationError::InvalidPhoneNumber { .. } => ErrorKind::InvalidPhoneNumber,
            VerificationError::MissingCode => ErrorKind::MissingCode,
            VerificationError::DeliveryFailed { .. } => ErrorKind::DeliveryFailed,
            VerificationError::NoPendingVerification => ErrorKind::NoPendingVerification,
            VerificationError::CodeExpired => ErrorKind::CodeExpired,
            VerificationError::CodeMismatch => ErrorKind::CodeMismatch,
            VerificationError::EntropyUnavailable { .. } => ErrorKind::EntropyUnavailable,
            VerificationError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
        }
    }
}

pub type VerificationResult<T> = Result<T, VerificationError>;
