//! Mapping of verification failures onto HTTP responses

use actix_web::{
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use validator::ValidationErrors;

use pv_core::errors::{ErrorKind, VerificationError};
use pv_shared::{error_codes, ErrorResponse};

/// HTTP status for each verification error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidPhoneNumber | ErrorKind::MissingCode | ErrorKind::CodeMismatch => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::NoPendingVerification => StatusCode::NOT_FOUND,
        ErrorKind::CodeExpired => StatusCode::GONE,
        ErrorKind::DeliveryFailed | ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::EntropyUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing message for each kind
///
/// Provider and backend details stay in the logs.
fn public_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidPhoneNumber => "Invalid phone number format. Use international format, e.g. +15551234567",
        ErrorKind::MissingCode => "Verification code is required",
        ErrorKind::DeliveryFailed => "Failed to send verification code. Please try again",
        ErrorKind::NoPendingVerification => "No pending verification for this phone number",
        ErrorKind::CodeExpired => "Verification code has expired. Please request a new one",
        ErrorKind::CodeMismatch => "Verification code does not match",
        ErrorKind::EntropyUnavailable => "Unable to generate a verification code",
        ErrorKind::StoreUnavailable => "Verification service temporarily unavailable",
    }
}

/// Convert a verification error into a JSON error response
pub fn verification_error_response(error: &VerificationError) -> HttpResponse {
    let kind = error.kind();
    let body = ErrorResponse::new(kind.as_code(), public_message(kind))
        .add_detail("retryable", kind.is_user_recoverable());

    HttpResponse::build(status_for(kind)).json(body)
}

/// 400 response carrying per-field validation messages
pub fn validation_error_response(errors: &ValidationErrors) -> HttpResponse {
    let mut body = ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data");

    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        body = body.add_detail(field, messages);
    }

    HttpResponse::BadRequest().json(body)
}

/// 400 response for a malformed request payload
pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(error_codes::VALIDATION_ERROR, message))
}

/// Replaces actix's plain-text body for unreadable JSON payloads
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, event = "invalid_json_payload", "Rejected request body");
    let response = bad_request(format!("Invalid JSON payload: {}", err));
    InternalError::from_response(err, response).into()
}

/// Same for malformed query strings
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, event = "invalid_query", "Rejected query string");
    let response = bad_request(format!("Invalid query string: {}", err));
    InternalError::from_response(err, response).into()
}
