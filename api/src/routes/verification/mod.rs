//! Verification route handlers
//!
//! - `POST /api/v1/verification/request-code` issue and send a code
//! - `POST /api/v1/verification/confirm` check a submitted code
//! - `GET  /api/v1/verification/status` describe the pending code
//! - `POST /api/v1/verification/cancel` discard the pending code

pub mod cancel;
pub mod confirm;
pub mod request_code;
pub mod status;

use actix_web::HttpRequest;
use std::borrow::Cow;
use uuid::Uuid;

use pv_core::errors::VerificationError;
use pv_shared::phone::mask_phone_number;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied request ID, or a fresh one
pub(crate) fn request_id(req: &HttpRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Undo form decoding of an unescaped leading `+` in a query string
///
/// `?phone=+15551234567` arrives as `" 15551234567"`.
pub(crate) fn restore_plus_prefix(phone: &str) -> Cow<'_, str> {
    let mut chars = phone.chars();
    match (chars.next(), chars.next()) {
        (Some(' '), Some(c)) if c.is_ascii_digit() => Cow::Owned(format!("+{}", &phone[1..])),
        _ => Cow::Borrowed(phone),
    }
}

/// Log a failed operation at a level matching who has to act on it
pub(crate) fn log_failure(request_id: &str, operation: &str, phone: &str, error: &VerificationError) {
    let kind = error.kind();
    if kind.is_user_recoverable() {
        tracing::info!(
            request_id = %request_id,
            operation = operation,
            phone = %mask_phone_number(phone),
            error_code = kind.as_code(),
            "Verification request rejected"
        );
    } else {
        tracing::error!(
            request_id = %request_id,
            operation = operation,
            phone = %mask_phone_number(phone),
            error_code = kind.as_code(),
            error = %error,
            "Verification request failed"
        );
    }
}
