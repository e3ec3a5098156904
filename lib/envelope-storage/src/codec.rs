//! Envelope codec: lossless conversion between [`TypedValue`] and [`Document`].
//!
//! Encoding resolves the envelope's type identifier, decodes the payload with
//! the matching schema, and renders it as a document with the identifier kept
//! in the reserved `@type` field:
//!
//! ```text
//! { "@type": "type.googleapis.com/google.protobuf.StringValue", "value": "hi" }
//! ```
//!
//! Decoding reads `@type` first and parses the rest of the document against
//! that schema. Documents without `@type` decode with the registry's default
//! schema when one is configured.

use std::sync::Arc;

use serde_json::Value;

use crate::{CodecError, Document, Schema, SchemaRegistry, TYPE_FIELD, TypedValue};

#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<SchemaRegistry>,
}

impl Codec {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Convert an envelope into its document form.
    ///
    /// Fails with `UnknownType` when the identifier does not resolve, with
    /// `InvalidPayload` when the bytes do not decode as the named message, and
    /// with `NotRepresentable` when the document would not decode back.
    pub fn encode(&self, value: &TypedValue) -> Result<Document, CodecError> {
        let schema = self.resolve(&value.type_url)?;

        let fields = schema
            .payload_to_document(&value.value)
            .map_err(|err| retag(err, &value.type_url))?;

        let mut document = Document::with_capacity(fields.len() + 1);
        document.insert(TYPE_FIELD.to_string(), Value::String(value.type_url.clone()));
        document.extend(fields);
        Ok(document)
    }

    /// Convert a stored document back into an envelope.
    pub fn decode(&self, mut document: Document) -> Result<TypedValue, CodecError> {
        let (type_url, schema) = match document.remove(TYPE_FIELD) {
            Some(Value::String(type_url)) => {
                let schema = self.resolve(&type_url)?;
                (type_url, schema)
            }
            Some(_) => return Err(CodecError::MissingType),
            None => {
                let schema = self
                    .registry
                    .default_schema()
                    .ok_or(CodecError::MissingType)?;
                (schema.type_url().to_string(), schema)
            }
        };

        let value = schema
            .document_to_payload(document)
            .map_err(|err| retag(err, &type_url))?;

        Ok(TypedValue { type_url, value })
    }

    fn resolve(&self, type_url: &str) -> Result<Arc<dyn Schema>, CodecError> {
        self.registry
            .resolve(type_url)
            .ok_or_else(|| CodecError::UnknownType(type_url.to_string()))
    }
}

/// Report schema errors under the identifier the caller used.
fn retag(err: CodecError, type_url: &str) -> CodecError {
    match err {
        CodecError::InvalidPayload { source, .. } => CodecError::InvalidPayload {
            type_url: type_url.to_string(),
            source,
        },
        CodecError::InvalidDocument { source, .. } => CodecError::InvalidDocument {
            type_url: type_url.to_string(),
            source,
        },
        CodecError::NotRepresentable { source, .. } => CodecError::NotRepresentable {
            type_url: type_url.to_string(),
            source,
        },
        other => other,
    }
}
