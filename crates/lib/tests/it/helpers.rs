use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use silt::Engine;
use tower::ServiceExt;

/// Creates an engine over the ephemeral in-memory backend.
pub fn setup_engine() -> Engine {
    Engine::in_memory()
}

/// Creates a shared engine and its API router, with no API key.
pub fn setup_router() -> (Arc<Engine>, Router) {
    let engine = Arc::new(Engine::in_memory());
    let router = silt::server::router(engine.clone(), None);
    (engine, router)
}

/// Creates a shared engine and its API router protected by `api_key`.
pub fn setup_router_with_key(api_key: &str) -> (Arc<Engine>, Router) {
    let engine = Arc::new(Engine::in_memory());
    let router = silt::server::router(engine.clone(), Some(api_key.to_string()));
    (engine, router)
}

/// Issue one request against the router and decode the JSON response body.
///
/// Returns the status and the body parsed as JSON (`Value::Null` for empty
/// bodies).
pub async fn call(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    call_with_headers(router, method, path, body, &[]).await
}

/// As [`call`], with extra request headers.
pub async fn call_with_headers(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("request failed");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };

    (status, body)
}
