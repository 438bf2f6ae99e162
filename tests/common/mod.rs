#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use keygate::{
    ServerConfig,
    auth::AuthConfig,
    create_app,
    registry::MemoryKeyRegistry,
    store::{UserRole, UserStore},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub const LOGIN: &str = "/api/session/login";
pub const ME: &str = "/api/session/me";
pub const LOGOUT: &str = "/api/session/logout";
pub const LOGOUT_ALL: &str = "/api/session/logout-all";

/// Hash at the minimum bcrypt cost so test setup stays fast.
pub fn test_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

pub fn test_users() -> UserStore {
    UserStore::new()
        .with_user("alice", &test_hash("wonderland"), UserRole::Admin)
        .with_user("bob", &test_hash("builder"), UserRole::User)
}

/// Config with generous rate limits so tests never trip them by accident.
pub fn test_config(auth: AuthConfig) -> (ServerConfig, Arc<MemoryKeyRegistry>) {
    let registry = Arc::new(MemoryKeyRegistry::new());
    let mut config = ServerConfig::new(auth, test_users());
    config.registry = registry.clone();
    config.login_per_sec = 1000;
    config.login_burst = 1000;
    config.trust_forwarded_for = true;
    (config, registry)
}

/// Create a test app with default auth settings and return (app, registry).
pub fn create_test_app() -> (Router, Arc<MemoryKeyRegistry>) {
    create_test_app_with(AuthConfig::default())
}

pub fn create_test_app_with(auth: AuthConfig) -> (Router, Arc<MemoryKeyRegistry>) {
    let (config, registry) = test_config(auth);
    (create_app(&config), registry)
}

pub fn login_request(subject: &str, password: &str, client: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(LOGIN)
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(
            json!({"subject": subject, "password": password}).to_string(),
        ))
        .unwrap()
}

pub async fn login(app: &Router, subject: &str, password: &str) -> Response<Body> {
    app.clone()
        .oneshot(login_request(subject, password, "192.0.2.1"))
        .await
        .unwrap()
}

/// Log in and return the issued token.
pub async fn login_token(app: &Router, subject: &str, password: &str) -> String {
    let response = login(app, subject, password).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

/// Send a request with a raw authorization header value.
pub async fn send(app: &Router, method: &str, uri: &str, authorization: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_me(app: &Router, token: &str) -> Response<Body> {
    send(app, "GET", ME, Some(&format!("Bearer {}", token))).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert an authorization rejection and return its body.
pub async fn assert_rejected(response: Response<Body>, status: StatusCode, kind: &str) -> Value {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["kind"], kind);
    body
}
