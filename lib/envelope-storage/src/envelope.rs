//! The typed envelope carried over the wire.

use prost::Message;

use crate::CodecError;

/// A self-describing value: a type identifier naming the payload's schema,
/// paired with the payload's protobuf encoding.
///
/// Field tags match `google.protobuf.Any`, so the two are interchangeable on
/// the wire.
#[derive(Clone, PartialEq, Eq, Hash, Message)]
pub struct TypedValue {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

impl TypedValue {
    pub fn new(type_url: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            type_url: type_url.into(),
            value: value.into(),
        }
    }

    /// The message name this envelope's identifier resolves to.
    pub fn full_name(&self) -> &str {
        full_name(&self.type_url)
    }
}

/// Extract the message name from a type identifier.
///
/// Everything after the last `/` is the name; an identifier without `/` is
/// already a name.
pub fn full_name(type_url: &str) -> &str {
    match type_url.rsplit_once('/') {
        Some((_, name)) => name,
        None => type_url,
    }
}

/// A protobuf message bound to a type identifier.
///
/// Usually implemented with `#[derive(TypedMessage)]`.
pub trait TypedMessage: Message + Default + Sized {
    const TYPE_URL: &'static str;

    fn full_name() -> &'static str {
        full_name(Self::TYPE_URL)
    }

    /// Wrap this message in an envelope.
    fn pack(&self) -> TypedValue {
        TypedValue {
            type_url: Self::TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }

    /// Extract a message of this type from an envelope.
    fn unpack(value: &TypedValue) -> Result<Self, CodecError> {
        if value.full_name() != Self::full_name() {
            return Err(CodecError::TypeMismatch {
                expected: Self::full_name().to_string(),
                found: value.type_url.clone(),
            });
        }

        Self::decode(value.value.as_slice()).map_err(|source| CodecError::InvalidPayload {
            type_url: value.type_url.clone(),
            source,
        })
    }
}
