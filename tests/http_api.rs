/// HTTP API tests
/// Drives the router directly with `oneshot`, no socket involved
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tenant_verify::config::Config;
use tenant_verify::fake_provider::FakeProvider;
use tenant_verify::handlers::{router, AppState, MAX_BODY_BYTES};
use tenant_verify::models::ProviderKind;
use tenant_verify::orchestrator::VerificationOrchestrator;
use tenant_verify::rate_limiter::RateLimiter;
use tower::ServiceExt;

fn create_test_app() -> axum::Router {
    let config = Config::from_lookup(|key| match key {
        "UIDAI_API_KEY" => Some("test_key".to_string()),
        _ => None,
    })
    .unwrap();
    let limiter = Arc::new(RateLimiter::from_config(&config));
    let orchestrator = VerificationOrchestrator::new(vec![
        FakeProvider::verified(ProviderKind::Identity).shared(),
        FakeProvider::verified(ProviderKind::Telecom).shared(),
    ]);

    router(Arc::new(AppState {
        config,
        limiter,
        orchestrator,
    }))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = create_test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tenant-verify");
}

#[tokio::test]
async fn test_verify_returns_report() {
    let payload = json!({
        "fullName": "Asha Rao",
        "identityNumber": "1234-5678-9012",
        "phoneNumber": "9876543210"
    });

    let response = create_test_app()
        .oneshot(post_json("/api/v1/verify", payload.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["overallScore"], 100);
    assert_eq!(report["riskLevel"], "Low");
    assert_eq!(report["verifications"]["identity"]["verified"], true);
    assert_eq!(report["tenantData"]["fullName"], "Asha Rao");
    assert!(report["id"].is_string());
}

#[tokio::test]
async fn test_verify_rejects_malformed_json() {
    let response = create_test_app()
        .oneshot(post_json("/api/v1/verify", "{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_verify_rejects_oversized_body() {
    let padding = "x".repeat(MAX_BODY_BYTES + 1);
    let payload = json!({ "fullName": padding }).to_string();

    let response = create_test_app()
        .oneshot(post_json("/api/v1/verify", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_provider_status_never_exposes_keys() {
    let response = create_test_app()
        .oneshot(Request::get("/api/v1/providers").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let providers = body.as_array().unwrap();
    assert_eq!(providers.len(), 6);
    assert_eq!(providers[0]["kind"], "identity");
    assert_eq!(providers[0]["configured"], true);
    assert_eq!(providers[1]["configured"], false);
    assert_eq!(providers[4]["rateLimit"], 30);
    assert!(!body.to_string().contains("test_key"));
}

#[tokio::test]
async fn test_provider_status_by_kind() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/api/v1/providers/rental").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["source"], "Rental History Database");
    assert_eq!(body["window"]["requestCount"], 0);

    let response = app
        .oneshot(Request::get("/api/v1/providers/credit").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unknown provider: credit");
}

#[tokio::test]
async fn test_cors_headers_survive_alongside_body_limit() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "chrome-extension://abcdef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let payload = json!({ "fullName": "x".repeat(MAX_BODY_BYTES + 1) }).to_string();
    let mut request = post_json("/api/v1/verify", payload);
    request.headers_mut().insert(
        header::ORIGIN,
        header::HeaderValue::from_static("chrome-extension://abcdef"),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
