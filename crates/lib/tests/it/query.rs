use serde_json::{Value, json};
use silt::{
    field::FieldPath,
    query::{Expr, Query},
};

use crate::helpers::setup_engine;

fn expr(raw: Value) -> Expr {
    serde_json::from_value(raw).expect("valid expression")
}

#[tokio::test]
async fn test_nested_query_scenario() {
    let engine = setup_engine();
    let users = [
        ("user1", "Alice", true),
        ("user2", "Bob", false),
        ("user3", "Charlie", true),
        ("user4", "Diana", false),
    ];
    for (key, name, enabled) in users {
        engine
            .set(
                key,
                json!({
                    "name": name,
                    "profile": {"settings": {"notifications": {"email": {"enabled": enabled}}}}
                }),
            )
            .await
            .unwrap();
    }

    let results = engine
        .query(&Query::filter(expr(json!({
            "Eq": ["profile.settings.notifications.email.enabled", true, "Bool"]
        }))))
        .await
        .unwrap();

    let names: Vec<&str> = results
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "Charlie"]);
}

#[tokio::test]
async fn test_pagination_scenario() {
    let engine = setup_engine();
    for i in 0..15 {
        engine
            .set(
                format!("item_{i:02}"),
                json!({"type": "pagination_test", "index": i}),
            )
            .await
            .unwrap();
    }

    let filter = expr(json!({"Eq": ["type", "pagination_test", "String"]}));

    let page = engine
        .query(&Query {
            filter: filter.clone(),
            projection: Vec::new(),
            limit: Some(5),
            offset: 7,
        })
        .await
        .unwrap();
    let indexes: Vec<i64> = page.iter().map(|doc| doc["index"].as_i64().unwrap()).collect();
    assert_eq!(indexes, vec![7, 8, 9, 10, 11]);

    let past_end = engine
        .query(&Query {
            filter,
            projection: Vec::new(),
            limit: Some(5),
            offset: 20,
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_projection_scenario() {
    let engine = setup_engine();
    let posts = [
        ("post1", "First", "author1", "Alice"),
        ("post2", "Second", "author2", "Bob"),
        ("post3", "Third", "author1", "Alice"),
    ];
    for (key, title, author_id, author_name) in posts {
        engine
            .set(
                key,
                json!({
                    "title": title,
                    "author": {"id": author_id, "name": author_name, "email": "x@example.com"},
                    "body": "lorem"
                }),
            )
            .await
            .unwrap();
    }

    let results = engine
        .query(&Query {
            filter: expr(json!({"Eq": ["author.id", "author1", "String"]})),
            projection: vec![FieldPath::new("title"), FieldPath::new("author.name")],
            limit: None,
            offset: 0,
        })
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![
            json!({"title": "First", "author": {"name": "Alice"}}),
            json!({"title": "Third", "author": {"name": "Alice"}}),
        ]
    );
}

#[tokio::test]
async fn test_compound_filters_over_indexes() {
    let engine = setup_engine();
    for (key, age, city, tags) in [
        ("p1", 25, "paris", json!(["rust"])),
        ("p2", 35, "paris", json!(["go", "rust"])),
        ("p3", 45, "lyon", json!(["go"])),
        ("p4", 55, "paris", json!([])),
    ] {
        engine
            .set(key, json!({"age": age, "city": city, "tags": tags}))
            .await
            .unwrap();
    }

    let results = engine
        .query(&Query::filter(expr(json!({
            "And": [
                {"And": [
                    {"Gte": ["age", 30, "Number"]},
                    {"Lt": ["age", 50, "Number"]}
                ]},
                {"Or": [
                    {"Includes": ["tags", "rust", "String"]},
                    {"Eq": ["city", "lyon", "String"]}
                ]}
            ]
        }))))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);

    let negated = engine
        .query(&Query::filter(expr(json!({
            "Not": {"Eq": ["city", "paris", "String"]}
        }))))
        .await
        .unwrap();
    assert_eq!(negated.len(), 1);
    assert_eq!(negated[0]["city"], json!("lyon"));
}

#[tokio::test]
async fn test_ne_is_false_for_absent_paths() {
    let engine = setup_engine();
    engine.set("with", json!({"level": 3})).await.unwrap();
    engine.set("without", json!({"other": 1})).await.unwrap();

    let results = engine
        .query(&Query::filter(expr(json!({"Ne": ["level", 9, "Number"]}))))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["level"], json!(3));
}

#[tokio::test]
async fn test_geo_radius_scenario() {
    let engine = setup_engine();
    // Points around lower Manhattan; the last one is across the Atlantic.
    for (key, lat, lon) in [
        ("poi/a", 40.7128, -74.0060),
        ("poi/b", 40.7138, -74.0050),
        ("poi/c", 40.7828, -73.9654),
        ("poi/d", 51.5074, -0.1278),
    ] {
        engine
            .set(key, json!({"id": key, "where": {"lat": lat, "lon": lon}}))
            .await
            .unwrap();
    }

    let close = engine
        .query_radius(FieldPath::new("where"), 40.7128, -74.0060, 500.0)
        .await
        .unwrap();
    let ids: Vec<&str> = close.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["poi/a", "poi/b"]);

    let boxed = engine
        .query_box(FieldPath::new("where"), 40.0, -75.0, 41.0, -73.0)
        .await
        .unwrap();
    assert_eq!(boxed.len(), 3);

    // Geo predicates compose with field predicates in the AST.
    let combined = engine
        .query(&Query::filter(expr(json!({
            "And": [
                {"GeoInBox": {
                    "field": "where",
                    "min_lat": 40.0, "min_lon": -75.0,
                    "max_lat": 41.0, "max_lon": -73.0
                }},
                {"Eq": ["id", "poi/c", "String"]}
            ]
        }))))
        .await
        .unwrap();
    assert_eq!(combined.len(), 1);
}

#[tokio::test]
async fn test_type_mismatch_is_silent_false() {
    let engine = setup_engine();
    engine.set("s", json!({"v": "10"})).await.unwrap();
    engine.set("n", json!({"v": 10})).await.unwrap();

    // The Number-typed literal only sees the numeric document.
    let results = engine
        .query(&Query::filter(expr(json!({"Eq": ["v", 10, "Number"]}))))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["v"], json!(10));
}
