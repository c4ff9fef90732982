//! Integration tests for the global HTTP layers.
//!
//! Tests cover:
//! - Credentialed CORS with explicit origins
//! - Health endpoint

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request},
};
use common::{response_json, TestApp};

const SHOP_ORIGIN: &str = "https://shop.example.com";

async fn credentialed_app() -> TestApp {
    TestApp::with_config(|cfg| {
        cfg.environment = "production".to_string();
        cfg.cors_allowed_origins = Some(format!("{SHOP_ORIGIN}, https://admin.example.com"));
        cfg.cors_allow_credentials = true;
    })
    .await
}

#[tokio::test]
async fn credentialed_cors_answers_preflight() {
    let app = credentialed_app().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/products/add")
        .header(header::ORIGIN, SHOP_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await;
    assert!(response.status().is_success());

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], SHOP_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_ascii_uppercase();
    assert!(methods.contains("POST"));
    assert!(methods.contains("DELETE"));
    assert_ne!(methods, "*");

    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("authorization"));
    assert!(allowed.contains("x-request-id"));
}

#[tokio::test]
async fn credentialed_cors_ignores_unlisted_origins() {
    let app = credentialed_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/products")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await;
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], "healthy");

    let response = app
        .request(Method::GET, "/status", None, None)
        .await;
    assert_eq!(response_json(response).await["service"], "catalog-api");
}
