#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use catalog_api::{config::AppConfig, db, services::catalog::CatalogService, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str =
    "integration-test-secret-9f8e7d6c5b4a3210-ZYXWVUTSRQPONMLKJIHGFEDCBA-0123456789abcdef";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Helper harness backed by a throwaway SQLite file with migrations applied.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

/// Tokens obtained through `/auth/login`
pub struct Session {
    pub access_token: String,
    /// Raw value of the refresh cookie
    pub refresh_token: String,
    pub user: Value,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_ttls(3600, 86_400).await
    }

    /// Same as [`TestApp::new`] with explicit access/refresh lifetimes in seconds.
    pub async fn with_ttls(access_ttl: u64, refresh_ttl: u64) -> Self {
        Self::with_config(|cfg| {
            cfg.jwt_expiration = access_ttl;
            cfg.refresh_token_expiration = refresh_ttl;
        })
        .await
    }

    /// Fresh application whose configuration is adjusted before the router is built.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("catalog_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        adjust(&mut cfg);
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = catalog_api::app_router(state.clone()).expect("router");

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    pub fn catalog(&self) -> Arc<CatalogService> {
        self.state.catalog.clone()
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        self.send(method, uri, body, token, None).await
    }

    /// Send a request carrying the refresh cookie.
    pub async fn request_with_cookie(
        &self,
        method: Method,
        uri: &str,
        refresh_token: &str,
        token: Option<&str>,
    ) -> Response {
        self.send(method, uri, None, token, Some(refresh_token))
            .await
    }

    /// Send a fully built request.
    pub async fn oneshot(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a raw body with a JSON content type.
    pub async fn request_raw(&self, method: Method, uri: &str, raw: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }
        let request = builder
            .body(Body::from(raw.to_string()))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }
        if let Some(refresh) = refresh_token {
            builder = builder.header(header::COOKIE, format!("refresh_token={}", refresh));
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Registers an account and returns the register response.
    pub async fn register(&self, name: &str, email: &str) -> Response {
        self.request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "name": name,
                "email": email,
                "password": TEST_PASSWORD,
                "password_confirmation": TEST_PASSWORD,
            })),
            None,
        )
        .await
    }

    /// Logs in and extracts the access token and refresh cookie.
    pub async fn login(&self, email: &str) -> Session {
        let response = self
            .request(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": email, "password": TEST_PASSWORD })),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "login should succeed");
        session_from(response).await
    }

    /// Registers a fresh account and logs it in.
    pub async fn signed_in(&self, email: &str) -> Session {
        let response = self.register("Test User", email).await;
        assert_eq!(response.status(), 201, "registration should succeed");
        self.login(email).await
    }

    /// Creates a product through the API and returns its view.
    pub async fn create_product(&self, token: &str, body: Value) -> Value {
        let response = self
            .request(Method::POST, "/products/add", Some(body), Some(token))
            .await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, 201, "product creation failed: {json}");
        json
    }

    pub async fn get_json(&self, uri: &str) -> (u16, Value) {
        let response = self.request(Method::GET, uri, None, None).await;
        let status = response.status().as_u16();
        (status, response_json(response).await)
    }
}

/// Minimal valid product payload.
pub fn product_body(title: &str, category: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "description": format!("{title} description"),
        "category": category,
        "price": 19.99,
        "stock": 10,
        "tags": tags,
    })
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

/// Value of the `refresh_token` cookie set on a response, if any.
pub fn refresh_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| {
            let first = raw.split(';').next()?.trim();
            first.strip_prefix("refresh_token=").map(str::to_string)
        })
}

/// Raw `Set-Cookie` header for the refresh cookie.
pub fn refresh_cookie_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|raw| raw.starts_with("refresh_token="))
        .map(str::to_string)
}

pub async fn session_from(response: Response) -> Session {
    let refresh_token = refresh_cookie(&response).expect("refresh cookie");
    let body = response_json(response).await;
    Session {
        access_token: body["access_token"]
            .as_str()
            .expect("access token")
            .to_string(),
        refresh_token,
        user: body["user"].clone(),
    }
}

/// Machine code of an auth failure body.
pub fn auth_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Field names listed in a validation failure body.
pub fn failing_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
