use actix_web::{http::StatusCode, test, web};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use pv_api::{create_app, AppState, PhoneVerifier};
use pv_core::services::verification::{
    CodeStore, ManualClock, SmsGateway, VerificationService, VerificationServiceConfig,
};
use pv_infra::{InMemoryCodeStore, MockSmsGateway};
use pv_shared::config::Environment;

const PHONE: &str = "+15551234567";

struct TestContext {
    state: web::Data<AppState>,
    store: Arc<InMemoryCodeStore>,
    gateway: Arc<MockSmsGateway>,
    clock: Arc<ManualClock>,
}

/// Helper function to create test application state
fn create_test_context(diagnostics_mode: bool) -> TestContext {
    let store = Arc::new(InMemoryCodeStore::new());
    let gateway = Arc::new(MockSmsGateway::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()));

    let sms: Arc<dyn SmsGateway> = gateway.clone();
    let codes: Arc<dyn CodeStore> = store.clone();
    let service: PhoneVerifier = VerificationService::new(
        sms,
        codes,
        VerificationServiceConfig {
            diagnostics_mode,
            ..VerificationServiceConfig::default()
        },
    )
    .with_clock(clock.clone());

    TestContext {
        state: web::Data::new(AppState::new(Arc::new(service), Environment::Development)),
        store,
        gateway,
        clock,
    }
}

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

#[actix_web::test]
async fn test_health_check() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "development");
}

#[actix_web::test]
async fn test_request_then_confirm_once() {
    let ctx = create_test_context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": "+1 (555) 123-4567" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["phone_number"], PHONE);
    assert_eq!(body["data"]["expires_in_seconds"], 600);
    let code = body["data"]["code"].as_str().unwrap().to_string();
    assert!(ctx.gateway.last_message(PHONE).unwrap().contains(&code));

    ctx.clock.advance(Duration::seconds(5));
    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": code })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["verified"], true);

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": code })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NO_PENDING_VERIFICATION");
}

#[actix_web::test]
async fn test_code_hidden_without_diagnostics() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": PHONE })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"].get("code").is_none());
    assert!(body["data"]["message_id"].as_str().unwrap().starts_with("mock_"));
}

#[actix_web::test]
async fn test_invalid_phone_rejected() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": "not-a-phone" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_PHONE_NUMBER");
    assert_eq!(ctx.gateway.message_count(), 0);
}

#[actix_web::test]
async fn test_empty_phone_fails_validation() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": "" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"]["phone"].is_array());
}

#[actix_web::test]
async fn test_malformed_json_returns_error_envelope() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/confirm")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"phone\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_wrong_code_then_correct_code() {
    let ctx = create_test_context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": PHONE })).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let code = body["data"]["code"].as_str().unwrap().to_string();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": wrong })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CODE_MISMATCH");
    assert_eq!(body["details"]["retryable"], true);

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": code })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_code() {
    let ctx = create_test_context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "MISSING_CODE");
}

#[actix_web::test]
async fn test_expired_code_is_gone() {
    let ctx = create_test_context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": PHONE })).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let code = body["data"]["code"].as_str().unwrap().to_string();

    ctx.clock.advance(Duration::seconds(601));
    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": code })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::GONE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CODE_EXPIRED");

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": code })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_status_and_cancel() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": PHONE })).to_request(),
    )
    .await;

    let status_uri = "/api/v1/verification/status?phone=%2B15551234567";
    let resp = test::call_service(&app, test::TestRequest::get().uri(status_uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["pending"], true);
    assert_eq!(body["data"]["expires_in_seconds"], 600);
    assert!(body["data"].get("code").is_none());

    for _ in 0..2 {
        let resp = test::call_service(
            &app,
            post("/api/v1/verification/cancel", json!({ "phone": PHONE })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert!(ctx.store.is_empty());

    let resp = test::call_service(&app, test::TestRequest::get().uri(status_uri).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["pending"], false);
}

#[actix_web::test]
async fn test_status_requires_phone_query() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/verification/status").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delivery_failure_keeps_code_valid() {
    let ctx = create_test_context(false);
    ctx.gateway.set_simulate_failure(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": PHONE })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "DELIVERY_FAILED");

    let record = ctx.store.get(PHONE).await.unwrap().unwrap();
    let resp = test::call_service(
        &app,
        post("/api/v1/verification/confirm", json!({ "phone": PHONE, "code": record.code })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_unknown_route() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v2/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_status_accepts_unescaped_plus() {
    let ctx = create_test_context(false);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        post("/api/v1/verification/request-code", json!({ "phone": PHONE })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/verification/status?phone=+15551234567")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["pending"], true);
}
