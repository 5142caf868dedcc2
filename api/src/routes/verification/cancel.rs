use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_shared::ApiResponse;

use super::{log_failure, request_id};
use crate::app::AppState;
use crate::dto::{CancelResponse, PhoneRequest};
use crate::handlers::error::{validation_error_response, verification_error_response};

/// Handler for POST /api/v1/verification/cancel
///
/// Idempotent: cancelling with nothing pending still returns 200.
pub async fn cancel(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<PhoneRequest>,
) -> HttpResponse {
    let request_id = request_id(&req);

    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state.verification_service.cancel(&request.phone).await {
        Ok(()) => HttpResponse::Ok().json(
            ApiResponse::success(CancelResponse {
                message: "Pending verification cancelled".to_string(),
            })
            .with_request_id(request_id),
        ),
        Err(error) => {
            log_failure(&request_id, "cancel", &request.phone, &error);
            verification_error_response(&error)
        }
    }
}
