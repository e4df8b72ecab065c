use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::StreamExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::helpers::{call, call_with_headers, setup_router, setup_router_with_key};

#[tokio::test]
async fn test_health_endpoint() {
    let (_engine, router) = setup_router();
    let (status, body) = call(&router, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_set_get_delete_round_trip() {
    let (_engine, router) = setup_router();

    let (status, _) = call(
        &router,
        "POST",
        "/set",
        Some(json!({"key": "user/1", "value": {"name": "Ann", "age": 30}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&router, "POST", "/get", Some(json!({"key": "user/1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "Ann", "age": 30}));

    let (status, _) = call(&router, "POST", "/delete", Some(json!({"key": "user/1"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&router, "POST", "/get", Some(json!({"key": "user/1"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Key not found"}));

    // Deleting an absent key is still a success.
    let (status, _) = call(&router, "POST", "/delete", Some(json!({"key": "user/1"}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_partial_endpoint() {
    let (_engine, router) = setup_router();
    call(
        &router,
        "POST",
        "/set",
        Some(json!({"key": "p", "value": {
            "title": "T", "author": {"name": "A", "id": "a1"}
        }})),
    )
    .await;

    let (status, body) = call(
        &router,
        "POST",
        "/get_partial",
        Some(json!({"key": "p", "fields": ["title", "author.name"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"title": "T", "author": {"name": "A"}}));

    let (status, _) = call(
        &router,
        "POST",
        "/get_partial",
        Some(json!({"key": "absent", "fields": ["title"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_endpoint_scenario() {
    let (_engine, router) = setup_router();
    call(
        &router,
        "POST",
        "/set",
        Some(json!({"key": "tx_delete_me", "value": "initial"})),
    )
    .await;

    let (status, _) = call(
        &router,
        "POST",
        "/transaction",
        Some(json!([
            {"type": "set", "key": "tx_set_key", "value": {"status": "set in transaction"}},
            {"type": "delete", "key": "tx_delete_me"},
            {"type": "set", "key": "tx_another_set", "value": 12345}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&router, "POST", "/get", Some(json!({"key": "tx_set_key"}))).await;
    assert_eq!(body, json!({"status": "set in transaction"}));
    let (_, body) = call(
        &router,
        "POST",
        "/get",
        Some(json!({"key": "tx_another_set"})),
    )
    .await;
    assert_eq!(body, json!(12345));
    let (status, _) = call(
        &router,
        "POST",
        "/get",
        Some(json!({"key": "tx_delete_me"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_transaction_is_client_error() {
    let (_engine, router) = setup_router();
    let (status, _) = call(
        &router,
        "POST",
        "/transaction",
        Some(json!([{"type": "merge", "key": "x"}])),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_clear_prefix_endpoint_scenario() {
    let (_engine, router) = setup_router();
    for key in ["prefix/key1", "prefix/key2", "prefix/deep/key3", "other_key"] {
        call(
            &router,
            "POST",
            "/set",
            Some(json!({"key": key, "value": {"v": key}})),
        )
        .await;
    }

    let (status, body) = call(
        &router,
        "POST",
        "/clear_prefix",
        Some(json!({"prefix": "prefix/"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 3}));

    for key in ["prefix/key1", "prefix/key2", "prefix/deep/key3"] {
        let (status, _) = call(&router, "POST", "/get", Some(json!({"key": key}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = call(&router, "POST", "/get", Some(json!({"key": "other_key"}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_drop_database_endpoint() {
    let (_engine, router) = setup_router();
    for i in 0..3 {
        call(
            &router,
            "POST",
            "/set",
            Some(json!({"key": format!("k{i}"), "value": i})),
        )
        .await;
    }

    let (status, body) = call(&router, "POST", "/drop_database", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 3}));

    let (_, body) = call(&router, "GET", "/export", None).await;
    let snapshot: Value = serde_json::from_str(body.as_str().unwrap()).unwrap();
    assert_eq!(snapshot, json!([]));
}

#[tokio::test]
async fn test_batch_set_and_query_ast() {
    let (_engine, router) = setup_router();
    let (status, _) = call(
        &router,
        "POST",
        "/batch_set",
        Some(json!([
            {"key": "a", "value": {"kind": "x", "n": 1}},
            {"key": "b", "value": {"kind": "y", "n": 2}},
            {"key": "c", "value": {"kind": "x", "n": 3}}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &router,
        "POST",
        "/query/ast",
        Some(json!({
            "ast": {"Eq": ["kind", "x", "String"]},
            "projection": ["n"],
            "limit": 10,
            "offset": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"n": 1}, {"n": 3}]));
}

#[tokio::test]
async fn test_query_validation_errors() {
    let (_engine, router) = setup_router();

    let (status, body) = call(
        &router,
        "POST",
        "/query/ast",
        Some(json!({"ast": {"Eq": ["n", "not a number", "Number"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Number"));

    let (status, _) = call(
        &router,
        "POST",
        "/query/radius",
        Some(json!({"field": "loc", "lat": 120.0, "lon": 0.0, "radius": 100.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown AST variants fail at deserialization.
    let (status, _) = call(
        &router,
        "POST",
        "/query/ast",
        Some(json!({"ast": {"Regex": ["n", ".*", "String"]}})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_geo_endpoints() {
    let (_engine, router) = setup_router();
    call(
        &router,
        "POST",
        "/batch_set",
        Some(json!([
            {"key": "near", "value": {"loc": {"lat": 40.0, "lon": -74.0}}},
            {"key": "far", "value": {"loc": {"lat": 10.0, "lon": 10.0}}}
        ])),
    )
    .await;

    let (status, body) = call(
        &router,
        "POST",
        "/query/radius",
        Some(json!({"field": "loc", "lat": 40.001, "lon": -74.0, "radius": 1000.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(
        &router,
        "POST",
        "/query/box",
        Some(json!({
            "field": "loc",
            "min_lat": 5.0, "min_lon": 5.0, "max_lat": 15.0, "max_lon": 15.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let (_engine, router) = setup_router();
    call(
        &router,
        "POST",
        "/set",
        Some(json!({"key": "x", "value": {"n": 1}})),
    )
    .await;

    // Export responds with a JSON *string* containing the snapshot array.
    let (status, body) = call(&router, "GET", "/export", None).await;
    assert_eq!(status, StatusCode::OK);
    let snapshot: Value = serde_json::from_str(body.as_str().unwrap()).unwrap();
    assert_eq!(snapshot, json!([{"key": "x", "value": {"n": 1}}]));

    let (fresh_engine, fresh_router) = setup_router();
    let (status, _) = call(&fresh_router, "POST", "/import", Some(snapshot)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fresh_engine.get("x").await.unwrap(), json!({"n": 1}));
}

#[tokio::test]
async fn test_api_key_enforcement() {
    let (_engine, router) = setup_router_with_key("sesame");

    // Health stays open.
    let (status, _) = call(&router, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let body = json!({"key": "k", "value": 1});
    let (status, response) = call(&router, "POST", "/set", Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response, json!({"error": "Unauthorized"}));

    let (status, _) = call_with_headers(
        &router,
        "POST",
        "/set",
        Some(body.clone()),
        &[("x-api-key", "wrong")],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_with_headers(
        &router,
        "POST",
        "/set",
        Some(body),
        &[("x-api-key", "sesame")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_events_stream_delivers_update() {
    let (engine, router) = setup_router();

    let response = router
        .clone()
        .oneshot(
            Request::get("/events?key=realtime_key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );

    let mut body = response.into_body().into_data_stream();

    engine
        .set("realtime_key", json!({"message": "hello from test"}))
        .await
        .unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("no SSE frame within the deadline")
        .expect("stream ended")
        .expect("stream errored");
    let frame = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(frame.contains("event: update"), "frame was: {frame}");
    assert!(
        frame.contains("{\"key\":\"realtime_key\"}"),
        "frame was: {frame}"
    );
}

#[tokio::test]
async fn test_events_stream_filters_by_key() {
    let (engine, router) = setup_router();

    let response = router
        .clone()
        .oneshot(Request::get("/events?key=only_this").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut body = response.into_body().into_data_stream();

    engine.set("something_else", json!(1)).await.unwrap();
    engine.set("only_this", json!(2)).await.unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("no SSE frame within the deadline")
        .expect("stream ended")
        .expect("stream errored");
    let frame = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(frame.contains("only_this"));
    assert!(!frame.contains("something_else"));
}
