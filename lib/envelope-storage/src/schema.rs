//! Schemas resolve a type identifier to the concrete message it names.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{CodecError, Document, TypedMessage, full_name};

/// Converts one message type between its protobuf payload and a document.
///
/// The document form never contains the `@type` field; the codec owns it.
pub trait Schema: Send + Sync {
    /// Canonical identifier of the message this schema handles.
    fn type_url(&self) -> &str;

    fn full_name(&self) -> &str {
        full_name(self.type_url())
    }

    /// Decode protobuf bytes and render the message as a document.
    fn payload_to_document(&self, payload: &[u8]) -> Result<Document, CodecError>;

    /// Parse a document as this message and return its protobuf bytes.
    fn document_to_payload(&self, document: Document) -> Result<Vec<u8>, CodecError>;
}

/// [`Schema`] for any serde-capable [`TypedMessage`].
///
/// Both directions go through canonical JSON text, so the document holds
/// exactly what the message's serde representation produces. Encoding fails
/// with `NotRepresentable` when that text does not parse back as `M`, as with
/// a plain `f64` field holding NaN (see [`json_double`](crate::json_double)).
pub struct MessageSchema<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M> MessageSchema<M> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M> Default for MessageSchema<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Schema for MessageSchema<M>
where
    M: TypedMessage + Serialize + DeserializeOwned + 'static,
{
    fn type_url(&self) -> &str {
        M::TYPE_URL
    }

    fn payload_to_document(&self, payload: &[u8]) -> Result<Document, CodecError> {
        let message = M::decode(payload).map_err(|source| CodecError::InvalidPayload {
            type_url: M::TYPE_URL.to_string(),
            source,
        })?;

        let text = serde_json::to_string(&message)?;
        let document = match serde_json::from_str::<Value>(&text)? {
            Value::Object(document) => document,
            _ => return Err(CodecError::NotAnObject(M::TYPE_URL.to_string())),
        };

        // A document that would not parse back cannot be stored.
        serde_json::from_str::<M>(&text).map_err(|source| CodecError::NotRepresentable {
            type_url: M::TYPE_URL.to_string(),
            source,
        })?;

        Ok(document)
    }

    fn document_to_payload(&self, document: Document) -> Result<Vec<u8>, CodecError> {
        let text = serde_json::to_string(&Value::Object(document))?;
        let message: M =
            serde_json::from_str(&text).map_err(|source| CodecError::InvalidDocument {
                type_url: M::TYPE_URL.to_string(),
                source,
            })?;

        Ok(message.encode_to_vec())
    }
}

/// Schemas known to a codec, keyed by message full name.
///
/// Identifiers resolve by full name, so `type.googleapis.com/pkg.Msg` and
/// `example.com/pkg.Msg` reach the same schema.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<dyn Schema>>,
    default_schema: Option<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `google.protobuf.*Value` wrappers.
    pub fn with_well_known() -> Self {
        let mut registry = Self::new();
        crate::well_known::register_all(&mut registry);
        registry
    }

    /// Register a message type. Replaces any schema with the same full name.
    pub fn register<M>(&mut self) -> &mut Self
    where
        M: TypedMessage + Serialize + DeserializeOwned + 'static,
    {
        self.register_schema(Arc::new(MessageSchema::<M>::new()));
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<M>(mut self) -> Self
    where
        M: TypedMessage + Serialize + DeserializeOwned + 'static,
    {
        self.register::<M>();
        self
    }

    /// Register a message type and use it for documents that carry no `@type`.
    pub fn with_default<M>(mut self) -> Self
    where
        M: TypedMessage + Serialize + DeserializeOwned + 'static,
    {
        self.register::<M>();
        self.default_schema = Some(M::full_name().to_string());
        self
    }

    /// Register a schema, returning the one it replaced.
    pub fn register_schema(&mut self, schema: Arc<dyn Schema>) -> Option<Arc<dyn Schema>> {
        let name = schema.full_name().to_string();
        tracing::debug!(schema = %name, "registering schema");
        self.schemas.insert(name, schema)
    }

    /// Use an already registered schema for documents that carry no `@type`.
    pub fn set_default_schema(&mut self, type_url: &str) -> Result<(), CodecError> {
        let name = full_name(type_url);
        if !self.schemas.contains_key(name) {
            return Err(CodecError::UnknownType(type_url.to_string()));
        }
        self.default_schema = Some(name.to_string());
        Ok(())
    }

    pub fn resolve(&self, type_url: &str) -> Option<Arc<dyn Schema>> {
        self.schemas.get(full_name(type_url)).cloned()
    }

    pub fn default_schema(&self) -> Option<Arc<dyn Schema>> {
        self.default_schema
            .as_deref()
            .and_then(|name| self.schemas.get(name).cloned())
    }

    pub fn contains(&self, type_url: &str) -> bool {
        self.schemas.contains_key(full_name(type_url))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered full names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.names())
            .field("default_schema", &self.default_schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known::{BoolValue, StringValue};
    use prost::Message;

    #[test]
    fn well_known_registry_resolves_by_full_name() {
        let registry = SchemaRegistry::with_well_known();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains("type.googleapis.com/google.protobuf.StringValue"));
        assert!(registry.contains("google.protobuf.BoolValue"));
        assert!(registry.contains("anything.example/google.protobuf.Int64Value"));
        assert!(!registry.contains("type.googleapis.com/google.protobuf.Timestamp"));
    }

    #[test]
    fn set_default_requires_registered_schema() {
        let mut registry = SchemaRegistry::with_well_known();
        let err = registry.set_default_schema("acme.Missing").unwrap_err();
        assert!(matches!(err, CodecError::UnknownType(name) if name == "acme.Missing"));
        assert!(registry.default_schema().is_none());

        registry.set_default_schema(StringValue::TYPE_URL).unwrap();
        let schema = registry.default_schema().unwrap();
        assert_eq!(schema.full_name(), "google.protobuf.StringValue");
    }

    #[test]
    fn registering_same_name_replaces() {
        let mut registry = SchemaRegistry::new();
        let first = registry.register_schema(Arc::new(MessageSchema::<BoolValue>::new()));
        assert!(first.is_none());
        let second = registry.register_schema(Arc::new(MessageSchema::<BoolValue>::new()));
        assert!(second.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn message_schema_round_trips_payload() {
        let schema = MessageSchema::<StringValue>::new();
        let payload = StringValue {
            value: "abc".to_string(),
        }
        .encode_to_vec();

        let document = schema.payload_to_document(&payload).unwrap();
        assert_eq!(document.get("value"), Some(&Value::String("abc".into())));
        assert_eq!(schema.document_to_payload(document).unwrap(), payload);
    }

    #[test]
    fn message_schema_rejects_garbage_payload() {
        let schema = MessageSchema::<StringValue>::new();
        let err = schema.payload_to_document(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidPayload { .. }));
    }
}
