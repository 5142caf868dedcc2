//! Application state and factory
//!
//! This module holds the shared application state and builds the
//! Actix-web application with every route registered.

use std::sync::Arc;

use actix_web::{dev::ServiceFactory, dev::ServiceRequest, dev::ServiceResponse, web, App, Error, HttpResponse};

use pv_core::services::verification::{CodeStore, SmsGateway, VerificationService};
use pv_shared::config::Environment;
use pv_shared::{error_codes, ErrorResponse};

use crate::handlers::error::{json_error_handler, query_error_handler};
use crate::routes::verification::{cancel, confirm, request_code, status};

/// Verification service over backends chosen at startup
pub type PhoneVerifier = VerificationService<dyn SmsGateway, dyn CodeStore>;

/// Application state shared by every worker
pub struct AppState {
    pub verification_service: Arc<PhoneVerifier>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(verification_service: Arc<PhoneVerifier>, environment: Environment) -> Self {
        Self {
            verification_service,
            environment,
        }
    }
}

/// Create the application with all routes and the JSON error handler
///
/// Middleware (CORS, request tracing) is added by the caller so tests can
/// exercise the routes without it.
pub fn create_app(
    app_state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(app_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/verification")
                    .route("/request-code", web::post().to(request_code::request_code))
                    .route("/confirm", web::post().to(confirm::confirm))
                    .route("/status", web::get().to(status::status))
                    .route("/cancel", web::post().to(cancel::cancel)),
            ),
        )
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "phone-verification-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment.to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
