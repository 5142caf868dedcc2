use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_shared::phone::mask_phone_number;
use pv_shared::ApiResponse;

use super::{log_failure, request_id};
use crate::app::AppState;
use crate::dto::{PhoneRequest, RequestCodeResponse};
use crate::handlers::error::{validation_error_response, verification_error_response};

/// Handler for POST /api/v1/verification/request-code
///
/// # Request Body
///
/// ```json
/// { "phone": "+15551234567" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "success": true,
///     "data": {
///         "phone_number": "+15551234567",
///         "expires_at": "2024-03-01T09:40:00Z",
///         "expires_in_seconds": 600,
///         "message_id": "SM42"
///     },
///     "timestamp": "2024-03-01T09:30:00Z",
///     "request_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// `data.code` is added only in diagnostics mode. A `DELIVERY_FAILED` (503)
/// response still leaves the issued code confirmable.
pub async fn request_code(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<PhoneRequest>,
) -> HttpResponse {
    let request_id = request_id(&req);

    if let Err(errors) = request.validate() {
        tracing::debug!(request_id = %request_id, "Validation failed for request-code");
        return validation_error_response(&errors);
    }

    tracing::info!(
        request_id = %request_id,
        phone = %mask_phone_number(&request.phone),
        "Processing request-code"
    );

    match state.verification_service.request_code(&request.phone).await {
        Ok(result) => {
            let ttl_seconds = state.verification_service.config().code_ttl().num_seconds();
            let data = RequestCodeResponse::from_result(result, ttl_seconds);
            HttpResponse::Ok().json(ApiResponse::success(data).with_request_id(request_id))
        }
        Err(error) => {
            log_failure(&request_id, "request_code", &request.phone, &error);
            verification_error_response(&error)
        }
    }
}
