use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the data or statement; repeating it fails the same way.
    #[error("Rejected by store: {0}")]
    Rejected(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// Whether the failure came from the storage boundary itself (connectivity,
    /// transport, backend rejection) and may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::StorageError(_))
    }
}

/// Failures converting between `TypedValue` envelopes and documents.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Document has no string \"@type\" field and no default schema is configured")]
    MissingType,

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Payload does not match {type_url}: {source}")]
    InvalidPayload {
        type_url: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Document does not match {type_url}: {source}")]
    InvalidDocument {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{type_url} has no document form that decodes back: {source}")]
    NotRepresentable {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not serialize to a JSON object")]
    NotAnObject(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
