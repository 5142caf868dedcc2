use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_shared::ApiResponse;

use super::{log_failure, request_id, restore_plus_prefix};
use crate::app::AppState;
use crate::dto::{PhoneRequest, StatusResponse};
use crate::handlers::error::{validation_error_response, verification_error_response};

/// Handler for GET /api/v1/verification/status?phone=...
///
/// Never reveals the code. An expired code reports `pending: false`.
/// An unescaped `+` in the query is accepted.
pub async fn status(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<PhoneRequest>,
) -> HttpResponse {
    let request_id = request_id(&req);

    if let Err(errors) = query.validate() {
        return validation_error_response(&errors);
    }

    let phone = restore_plus_prefix(&query.phone);

    match state
        .verification_service
        .pending_verification(&phone)
        .await
    {
        Ok(pending) => HttpResponse::Ok()
            .json(ApiResponse::success(StatusResponse::from(pending)).with_request_id(request_id)),
        Err(error) => {
            log_failure(&request_id, "status", &phone, &error);
            verification_error_response(&error)
        }
    }
}
