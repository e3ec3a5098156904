//! SurrealStore against SurrealDB's embedded in-memory engine.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use envelope_storage::well_known::{DoubleValue, UInt64Value};
use envelope_storage::{
    Codec, Document, RecordKey, RecordStore, SchemaRegistry, StorageError, TypedMessage,
};
use envelope_storage_surreal::SurrealStore;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn store(table: &str) -> SurrealStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    let store = SurrealStore::new(db, table).unwrap();
    store.define_table().await.unwrap();
    store
}

fn document(label: &str) -> Document {
    let mut document = Document::new();
    document.insert("@type".into(), json!("type.googleapis.com/google.protobuf.StringValue"));
    document.insert("value".into(), json!(label));
    document
}

#[tokio::test]
async fn empty_table_is_not_found() {
    let store = store("records").await;
    assert!(matches!(
        store.fetch_one().await.unwrap_err(),
        StorageError::NotFound(_)
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn insert_and_fetch_by_key() {
    let store = store("records").await;
    let first = store.insert(document("one")).await.unwrap();
    let second = store.insert(document("two")).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 2);

    let record = store.fetch_by_key(&first).await.unwrap();
    assert_eq!(record.key, first);
    assert_eq!(record.document, document("one"));

    let record = store.fetch_by_key(&second).await.unwrap();
    assert_eq!(record.document, document("two"));
}

#[tokio::test]
async fn fetch_one_returns_latest() {
    let store = store("records").await;
    store.insert(document("old")).await.unwrap();
    let latest = store.insert(document("new")).await.unwrap();

    let record = store.fetch_one().await.unwrap();
    assert_eq!(record.key, latest);
    assert_eq!(record.document.get("value"), Some(&json!("new")));
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let store = store("records").await;
    store.insert(document("x")).await.unwrap();
    assert!(matches!(
        store
            .fetch_by_key(&RecordKey::from("no-such-key"))
            .await
            .unwrap_err(),
        StorageError::NotFound(_)
    ));
}

#[tokio::test]
async fn nested_values_survive_storage() {
    let store = store("nested").await;
    let mut document = Document::new();
    document.insert("@type".into(), json!("type.example.com/acme.Profile"));
    document.insert("tags".into(), json!(["a", "b"]));
    document.insert("address".into(), json!({ "city": "Oslo", "zip": 150 }));
    document.insert("active".into(), json!(true));

    let key = store.insert(document.clone()).await.unwrap();
    assert_eq!(store.fetch_by_key(&key).await.unwrap().document, document);
}

#[tokio::test]
async fn invalid_table_name_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    let result = SurrealStore::new(db, "records; REMOVE TABLE records");
    assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
}

#[tokio::test]
async fn integers_beyond_i64_are_kept() {
    let store = store("wide").await;

    for number in [u64::MAX, 1u64 << 63] {
        let mut document = Document::new();
        document.insert("value".into(), json!(number));

        let key = store.insert(document.clone()).await.unwrap();
        let stored = store.fetch_by_key(&key).await.unwrap().document;
        assert_eq!(stored, document);
        assert_eq!(stored.get("value").and_then(|v| v.as_u64()), Some(number));
    }
}

#[tokio::test]
async fn codec_output_round_trips_through_the_table() {
    let store = store("typed").await;
    let codec = Codec::new(SchemaRegistry::with_well_known());
    let values = [
        UInt64Value { value: u64::MAX }.pack(),
        UInt64Value { value: 1 << 63 }.pack(),
        DoubleValue { value: f64::NAN }.pack(),
        DoubleValue { value: 2.0 }.pack(),
    ];

    for value in values {
        let key = store.insert(codec.encode(&value).unwrap()).await.unwrap();
        let record = store.fetch_by_key(&key).await.unwrap();
        assert_eq!(codec.decode(record.document).unwrap(), value);
    }
}

#[tokio::test]
async fn reserved_word_tables_work() {
    for table in ["order", "select", "user"] {
        let store = store(table).await;
        let key = store.insert(document(table)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.fetch_one().await.unwrap().key, key);
        assert_eq!(store.fetch_by_key(&key).await.unwrap().document, document(table));
    }
}
