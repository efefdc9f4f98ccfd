use std::time::Duration;

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::request_id::XRequestId;
use api_ingress::{ApiIngress, ApiIngressConfig};

fn test_app(config: ApiIngressConfig) -> Router {
    let routes = Router::new()
        .route(
            "/echo-id",
            get(|Extension(rid): Extension<XRequestId>| async move { rid.0 }),
        )
        .route("/upload", post(|body: String| async move { body.len().to_string() }));

    ApiIngress::new(config, Duration::from_secs(5)).build_router(routes)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let response = test_app(ApiIngressConfig::default())
        .oneshot(Request::builder().uri("/echo-id").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert!(!header.is_empty());

    // The handler sees the same id that is echoed back.
    assert_eq!(body_string(response).await, header);
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let response = test_app(ApiIngressConfig::default())
        .oneshot(
            Request::builder()
                .uri("/echo-id")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
    assert_eq!(body_string(response).await, "abc-123");
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let response = test_app(ApiIngressConfig::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ApiIngressConfig {
        max_body_bytes: 16,
        ..Default::default()
    };

    let response = test_app(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", "text/plain")
                .header("content-length", "64")
                .body(Body::from("x".repeat(64)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_headers_only_when_enabled() {
    let preflight = || {
        Request::builder()
            .method("OPTIONS")
            .uri("/echo-id")
            .header("origin", "http://example.com")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap()
    };

    let disabled = test_app(ApiIngressConfig::default())
        .oneshot(preflight())
        .await
        .unwrap();
    assert!(disabled
        .headers()
        .get("access-control-allow-origin")
        .is_none());

    let enabled = test_app(ApiIngressConfig {
        cors_enabled: true,
        ..Default::default()
    })
    .oneshot(preflight())
    .await
    .unwrap();
    assert_eq!(
        enabled
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
