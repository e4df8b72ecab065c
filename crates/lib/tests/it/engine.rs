use std::time::Duration;

use serde_json::json;
use silt::engine::{Mutation, Record};

use crate::helpers::setup_engine;

#[tokio::test]
async fn test_transaction_scenario() {
    let engine = setup_engine();
    engine.set("tx_delete_me", json!("initial")).await.unwrap();

    engine
        .transaction(vec![
            Mutation::Set {
                key: "tx_set_key".into(),
                value: json!({"status": "set in transaction"}),
            },
            Mutation::Delete {
                key: "tx_delete_me".into(),
            },
            Mutation::Set {
                key: "tx_another_set".into(),
                value: json!(12345),
            },
        ])
        .await
        .unwrap();

    assert_eq!(
        engine.get("tx_set_key").await.unwrap(),
        json!({"status": "set in transaction"})
    );
    assert_eq!(engine.get("tx_another_set").await.unwrap(), json!(12345));
    assert!(engine.get("tx_delete_me").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_live_update_scenario() {
    let engine = setup_engine();
    let mut subscription = engine.subscribe("realtime_key");

    engine
        .set("realtime_key", json!({"message": "hello from test"}))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("no event within the deadline")
        .expect("subscription closed");
    assert_eq!(event.key, "realtime_key");

    assert_eq!(
        engine.get("realtime_key").await.unwrap(),
        json!({"message": "hello from test"})
    );
}

#[tokio::test]
async fn test_subscriber_sees_every_commit_in_order() {
    let engine = setup_engine();
    let mut subscription = engine.subscribe("counter");

    for i in 0..5 {
        engine.set("counter", json!(i)).await.unwrap();
    }
    engine.delete("counter").await.unwrap();

    for _ in 0..6 {
        let event = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("missing event")
            .expect("subscription closed");
        assert_eq!(event.key, "counter");
    }
}

#[tokio::test]
async fn test_import_export_preserve_field_order() {
    let engine = setup_engine();
    let doc = json!({"zebra": 1, "apple": 2, "mango": {"z": 1, "a": 2}});
    engine.set("ordered", doc.clone()).await.unwrap();

    // Object field insertion order survives storage and export.
    let fetched = engine.get("ordered").await.unwrap();
    assert_eq!(
        serde_json::to_string(&fetched).unwrap(),
        serde_json::to_string(&doc).unwrap()
    );

    let snapshot = engine.export().await.unwrap();
    assert_eq!(snapshot, vec![Record {
        key: "ordered".into(),
        value: doc,
    }]);
}

#[cfg(feature = "sled-backend")]
#[tokio::test]
async fn test_sled_engine_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = silt::Engine::open_sled(dir.path()).unwrap();
        engine
            .set("durable", json!({"n": 1, "tags": ["a"]}))
            .await
            .unwrap();
        engine.set("gone", json!(true)).await.unwrap();
        engine.delete("gone").await.unwrap();
    }

    let engine = silt::Engine::open_sled(dir.path()).unwrap();
    assert_eq!(
        engine.get("durable").await.unwrap(),
        json!({"n": 1, "tags": ["a"]})
    );
    assert!(engine.get("gone").await.unwrap_err().is_not_found());

    // Indexes recovered with the documents: a query must still plan off them.
    let results = engine
        .query(&silt::query::Query::filter(
            serde_json::from_value(json!({"Includes": ["tags", "a", "String"]})).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_clear_prefix_publishes_deletes() {
    let engine = setup_engine();
    engine.set("logs/1", json!(1)).await.unwrap();
    engine.set("logs/2", json!(2)).await.unwrap();
    engine.set("keep", json!(3)).await.unwrap();

    let mut subscription = engine.subscribe_all();
    let count = engine.clear_prefix("logs/").await.unwrap();
    assert_eq!(count, 2);

    let first = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.key, "logs/1");
    assert_eq!(second.key, "logs/2");
}
