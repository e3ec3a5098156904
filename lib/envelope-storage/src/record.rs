//! Documents and the records that persist them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{StorageDatetime, StorageError};

/// Schema-less at-rest representation: field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Reserved document field holding the envelope's type identifier.
pub const TYPE_FIELD: &str = "@type";

/// Longest collection name accepted by [`validate_collection_name`].
const MAX_COLLECTION_NAME_LEN: usize = 63;

/// Store-assigned record identifier.
///
/// Generated keys are UUIDv7 strings, so they sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn generate() -> Self {
        RecordKey(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordKey {
    fn from(key: String) -> Self {
        RecordKey(key)
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey(key.to_string())
    }
}

/// One persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub created_at: StorageDatetime,
    pub document: Document,
}

impl Record {
    /// Wrap a document with a fresh key and the current time.
    pub fn new(document: Document) -> Self {
        Self {
            key: RecordKey::generate(),
            created_at: StorageDatetime::now(),
            document,
        }
    }

    /// Ordering used by `fetch_one`: newest first, key breaks ties.
    pub fn is_newer_than(&self, other: &Record) -> bool {
        (&self.created_at, &self.key) > (&other.created_at, &other.key)
    }
}

/// Check that a collection name is safe to splice into a backend query.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to 63 bytes (the PostgreSQL identifier
/// limit, which SurrealDB table names also satisfy).
pub fn validate_collection_name(name: &str) -> Result<(), StorageError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest {
        return Err(StorageError::InvalidConfig(format!(
            "collection name {:?} must match [A-Za-z_][A-Za-z0-9_]*",
            name
        )));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(StorageError::InvalidConfig(format!(
            "collection name {:?} exceeds {} bytes",
            name, MAX_COLLECTION_NAME_LEN
        )));
    }
    Ok(())
}
