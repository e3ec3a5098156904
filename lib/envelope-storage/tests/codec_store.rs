//! Codec and in-memory store working together, with messages defined outside
//! the crate the way downstream users define them.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use envelope_storage::{
    Codec, CodecError, Document, MemoryStore, RecordStore, RetryPolicy, RetryingStore,
    SchemaRegistry, TYPE_FIELD, TypedMessage, TypedValue,
};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[typed(full_name = "inventory.Item")]
#[serde(default, deny_unknown_fields)]
struct Item {
    #[prost(string, tag = "1")]
    sku: String,
    #[prost(int32, tag = "2")]
    quantity: i32,
    #[prost(bool, tag = "3")]
    discontinued: bool,
    #[prost(double, repeated, tag = "4")]
    prices: Vec<f64>,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[serde(default, deny_unknown_fields)]
struct Bare {
    #[prost(string, tag = "1")]
    label: String,
}

fn codec() -> Codec {
    Codec::new(
        SchemaRegistry::with_well_known()
            .with::<Item>()
            .with::<Bare>(),
    )
}

fn item() -> Item {
    Item {
        sku: "A-100".into(),
        quantity: 3,
        discontinued: false,
        prices: vec![9.5, 8.25],
    }
}

#[test]
fn derive_defaults() {
    assert_eq!(Item::TYPE_URL, "type.googleapis.com/inventory.Item");
    assert_eq!(Item::full_name(), "inventory.Item");
    assert_eq!(Bare::TYPE_URL, "type.googleapis.com/Bare");
}

#[tokio::test]
async fn stored_document_decodes_to_original() {
    let codec = codec();
    let store = MemoryStore::new();
    let value = item().pack();

    let key = store.insert(codec.encode(&value).unwrap()).await.unwrap();
    let record = store.fetch_by_key(&key).await.unwrap();

    assert_eq!(record.document.get(TYPE_FIELD), Some(&json!(Item::TYPE_URL)));
    assert_eq!(record.document.get("sku"), Some(&json!("A-100")));

    let decoded = codec.decode(record.document).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(Item::unpack(&decoded).unwrap(), item());
}

#[tokio::test]
async fn unknown_type_never_reaches_store() {
    let codec = codec();
    let store = MemoryStore::new();
    let value = TypedValue::new("type.googleapis.com/inventory.Missing", vec![1, 2]);

    let result = codec.encode(&value);
    assert!(matches!(result, Err(CodecError::UnknownType(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn retrying_wrapper_is_transparent_on_success() {
    let codec = codec();
    let store = RetryingStore::new(MemoryStore::new(), RetryPolicy::with_attempts(3));
    let value = item().pack();

    store.insert(codec.encode(&value).unwrap()).await.unwrap();
    let record = store.fetch_one().await.unwrap();
    assert_eq!(codec.decode(record.document).unwrap(), value);
}

#[test]
fn hand_written_document_decodes() {
    let mut document = Document::new();
    document.insert(TYPE_FIELD.into(), json!("type.googleapis.com/inventory.Item"));
    document.insert("sku".into(), json!("B-7"));
    document.insert("prices".into(), json!([1.0]));

    let value = codec().decode(document).unwrap();
    let decoded = Item::unpack(&value).unwrap();
    assert_eq!(decoded.sku, "B-7");
    assert_eq!(decoded.quantity, 0);
    assert_eq!(decoded.prices, vec![1.0]);
}
