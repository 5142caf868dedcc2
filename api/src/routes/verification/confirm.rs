use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_shared::ApiResponse;

use super::{log_failure, request_id};
use crate::app::AppState;
use crate::dto::{ConfirmRequest, ConfirmResponse};
use crate::handlers::error::{validation_error_response, verification_error_response};

/// Handler for POST /api/v1/verification/confirm
///
/// Body: `{ "phone": "+15551234567", "code": "048213" }`.
/// A correct code succeeds once; afterwards the phone has nothing pending
/// (404). A wrong code is 400 `CODE_MISMATCH` and may be retried, an
/// expired one is 410 `CODE_EXPIRED`.
pub async fn confirm(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<ConfirmRequest>,
) -> HttpResponse {
    let request_id = request_id(&req);

    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state
        .verification_service
        .confirm(&request.phone, &request.code)
        .await
    {
        Ok(result) => HttpResponse::Ok()
            .json(ApiResponse::success(ConfirmResponse::from(result)).with_request_id(request_id)),
        Err(error) => {
            log_failure(&request_id, "confirm", &request.phone, &error);
            verification_error_response(&error)
        }
    }
}
