//! Shared fixtures for the crate's unit tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use social_common::AppConfig;
use social_core::Snowflake;
use social_service::testing::{InMemoryStore, TEST_JWT_SECRET};
use tower::ServiceExt;

use crate::server::create_app;
use crate::state::AppState;

pub fn config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgresql://unused@localhost/unused".to_string()),
        "JWT_SECRET" => Some(TEST_JWT_SECRET.to_string()),
        "RATE_LIMIT_REQUESTS_PER_SECOND" => Some("1000".to_string()),
        "RATE_LIMIT_BURST" => Some("1000".to_string()),
        _ => None,
    })
    .expect("test configuration")
}

pub fn app(store: &InMemoryStore) -> (Router, AppState) {
    let state = AppState::new(store.context(), config());
    let app = create_app(state.clone()).expect("router");
    (app, state)
}

pub fn token_for(state: &AppState, user_id: Snowflake) -> String {
    state
        .jwt_service()
        .generate_token_pair(user_id, None)
        .expect("token pair")
        .access_token
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value, Response<()>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (parts.status, json, Response::from_parts(parts, ()))
}
