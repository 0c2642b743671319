// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use typing_tracker::config::Config;
use typing_tracker::db::MemoryDb;
use typing_tracker::routes::create_router;
use typing_tracker::AppState;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Create a test app backed by an empty in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, MemoryDb::new()));
    (create_router(state.clone()), state)
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON. Empty bodies become `Value::Null`.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Send a request and return the status and JSON body.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Register `login_id` and log in. Returns the login response body.
#[allow(dead_code)]
pub async fn register_and_login(app: &Router, login_id: &str) -> Value {
    let credentials = serde_json::json!({ "login_id": login_id, "password": TEST_PASSWORD });

    let (status, _) = send(
        app,
        request("POST", "/auth/register", None, Some(credentials.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, request("POST", "/auth/login", None, Some(credentials))).await;
    assert_eq!(status, StatusCode::OK);
    body
}

/// Register, log in and return the access token.
#[allow(dead_code)]
pub async fn access_token_for(app: &Router, login_id: &str) -> String {
    register_and_login(app, login_id).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Create an English study text owned by the token's user and return its id.
#[allow(dead_code)]
pub async fn create_text(app: &Router, token: &str, content: &str) -> String {
    create_text_in(app, token, "english", content).await
}

/// Create a study text in `language` and return its id.
#[allow(dead_code)]
pub async fn create_text_in(app: &Router, token: &str, language: &str, content: &str) -> String {
    let body = serde_json::json!({ "language": language, "content": content });
    let (status, body) = post(app, "/api/texts", token, body).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

/// `GET uri` with a bearer token.
#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, request("GET", uri, Some(token), None)).await
}

/// `POST uri` with a bearer token and JSON body.
#[allow(dead_code)]
pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, request("POST", uri, Some(token), Some(body))).await
}

/// `PUT uri` with a bearer token and JSON body.
#[allow(dead_code)]
pub async fn put(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, request("PUT", uri, Some(token), Some(body))).await
}

/// Start a session on `text_id` and return its id.
#[allow(dead_code)]
pub async fn start_session(app: &Router, token: &str, text_id: &str) -> String {
    let body = serde_json::json!({ "study_text_id": text_id });
    let (status, session) = post(app, "/api/sessions", token, body).await;
    assert_eq!(status, StatusCode::CREATED);
    session["id"].as_str().unwrap().to_string()
}
