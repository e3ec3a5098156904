//! Wrapper messages under `google.protobuf.*`, registered by
//! [`SchemaRegistry::with_well_known`](crate::SchemaRegistry::with_well_known).

use prost::Message;
use serde::{Deserialize, Serialize};

use crate::{SchemaRegistry, TypedMessage};

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[typed(full_name = "google.protobuf.StringValue")]
#[serde(default, deny_unknown_fields)]
pub struct StringValue {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[typed(full_name = "google.protobuf.Int64Value")]
#[serde(default, deny_unknown_fields)]
pub struct Int64Value {
    #[prost(int64, tag = "1")]
    pub value: i64,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[typed(full_name = "google.protobuf.UInt64Value")]
#[serde(default, deny_unknown_fields)]
pub struct UInt64Value {
    #[prost(uint64, tag = "1")]
    pub value: u64,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[typed(full_name = "google.protobuf.DoubleValue")]
#[serde(default, deny_unknown_fields)]
pub struct DoubleValue {
    #[prost(double, tag = "1")]
    #[serde(with = "crate::json_double")]
    pub value: f64,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize, TypedMessage)]
#[typed(full_name = "google.protobuf.BoolValue")]
#[serde(default, deny_unknown_fields)]
pub struct BoolValue {
    #[prost(bool, tag = "1")]
    pub value: bool,
}

pub(crate) fn register_all(registry: &mut SchemaRegistry) {
    registry
        .register::<StringValue>()
        .register::<Int64Value>()
        .register::<UInt64Value>()
        .register::<DoubleValue>()
        .register::<BoolValue>();
}
