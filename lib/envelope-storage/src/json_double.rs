//! Serde adapter for `double` fields that keeps non-finite values.
//!
//! JSON numbers cannot hold NaN or the infinities, so they are written as the
//! strings `"NaN"`, `"Infinity"` and `"-Infinity"`, the same spelling the
//! protobuf JSON mapping uses. Either form is accepted on input.
//!
//! ```text
//! #[prost(double, tag = "1")]
//! #[serde(with = "envelope_storage::json_double")]
//! pub value: f64,
//! ```

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str(NAN)
    } else if value.is_infinite() && value.is_sign_positive() {
        serializer.serialize_str(INFINITY)
    } else if value.is_infinite() {
        serializer.serialize_str(NEG_INFINITY)
    } else {
        serializer.serialize_f64(*value)
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(DoubleVisitor)
}

struct DoubleVisitor;

impl Visitor<'_> for DoubleVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v {
            NAN => Ok(f64::NAN),
            INFINITY => Ok(f64::INFINITY),
            NEG_INFINITY => Ok(f64::NEG_INFINITY),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "crate::json_double")]
        value: f64,
    }

    fn to_json(value: f64) -> serde_json::Value {
        serde_json::to_value(Sample { value }).unwrap()
    }

    fn from_json(value: serde_json::Value) -> f64 {
        serde_json::from_value::<Sample>(value).unwrap().value
    }

    #[test]
    fn finite_values_stay_numbers() {
        assert_eq!(to_json(1.5), json!({ "value": 1.5 }));
        assert_eq!(from_json(json!({ "value": 1.5 })), 1.5);
        assert_eq!(from_json(json!({ "value": 3 })), 3.0);
        assert_eq!(from_json(json!({ "value": -3 })), -3.0);
    }

    #[test]
    fn non_finite_values_use_names() {
        assert_eq!(to_json(f64::NAN), json!({ "value": "NaN" }));
        assert_eq!(to_json(f64::INFINITY), json!({ "value": "Infinity" }));
        assert_eq!(to_json(f64::NEG_INFINITY), json!({ "value": "-Infinity" }));

        assert!(from_json(json!({ "value": "NaN" })).is_nan());
        assert_eq!(from_json(json!({ "value": "Infinity" })), f64::INFINITY);
        assert_eq!(from_json(json!({ "value": "-Infinity" })), f64::NEG_INFINITY);
    }

    #[test]
    fn other_strings_are_rejected() {
        let result = serde_json::from_value::<Sample>(json!({ "value": "1.5" }));
        assert!(result.is_err());
        let result = serde_json::from_value::<Sample>(json!({ "value": null }));
        assert!(result.is_err());
    }
}
