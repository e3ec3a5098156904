//! Storage traits for envelope documents.
//!
//! - `RecordStore`: single-record insert and fetch against a document store
//! - `RepositoryConnection`: Database connection and initialization

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Document, Record, RecordKey, StorageError};

/// Default collection (table) name for stored records.
pub const DEFAULT_COLLECTION: &str = "records";

/// Connection configuration for database backends.
///
/// The URL is required; the remaining settings are interpreted by the backend
/// that needs them (namespace only matters to SurrealDB, max connections only
/// to PostgreSQL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub url: String,
    pub namespace: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: Option<u32>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: None,
            database: None,
            collection: None,
            username: None,
            password: None,
            max_connections: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// The configured collection, or [`DEFAULT_COLLECTION`].
    pub fn collection_or_default(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::new(url)
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::new(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::new(url.clone())
    }
}

/// Trait for database connection and initialization.
///
/// This trait abstracts the database connection lifecycle, allowing
/// different backends (PostgreSQL, SurrealDB, etc.) to implement
/// their own connection and schema setup.
#[async_trait]
pub trait RepositoryConnection: Sized + Send + Sync {
    /// Connect to the database using the provided configuration.
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, StorageError>;

    /// Create the collection if it does not exist yet.
    async fn initialize(&self) -> Result<(), StorageError>;
}

/// Raw document persistence with no query semantics.
///
/// Every operation is a single round trip to the backend. Implementations do
/// not retry; wrap a store in [`RetryingStore`](crate::RetryingStore) for that.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append the document as a new record and return its generated key.
    ///
    /// No deduplication: inserting the same document twice creates two records.
    async fn insert(&self, document: Document) -> Result<RecordKey, StorageError>;

    /// Return one record by the store's default selection.
    ///
    /// Stores in this workspace select the most recently created record.
    /// Fails with `NotFound` when the collection is empty.
    async fn fetch_one(&self) -> Result<Record, StorageError>;

    /// Return the record with the given key, or `NotFound`.
    async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<u64, StorageError>;
}

#[async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn insert(&self, document: Document) -> Result<RecordKey, StorageError> {
        (**self).insert(document).await
    }

    async fn fetch_one(&self) -> Result<Record, StorageError> {
        (**self).fetch_one().await
    }

    async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError> {
        (**self).fetch_by_key(key).await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        (**self).count().await
    }
}
