//! SurrealDB implementation for envelope-storage.
//!
//! This crate provides a [`RecordStore`](envelope_storage::RecordStore) that
//! keeps envelope documents in a SurrealDB table.
//!
//! # Example
//!
//! ```text
//! use envelope_storage::{ConnectionConfig, RepositoryConnection};
//! use envelope_storage_surreal::SurrealStore;
//!
//! let config = ConnectionConfig::new("ws://localhost:8000")
//!     .namespace("envelope")
//!     .database("envelope")
//!     .collection("records")
//!     .credentials("root", "root");
//! let store = SurrealStore::connect(config).await?;
//! store.initialize().await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod store;

pub use store::{DEFAULT_DATABASE, DEFAULT_NAMESPACE, SurrealStore};

// Re-export core types for convenience
pub use envelope_storage::{
    ConnectionConfig, Document, Record, RecordKey, RecordStore, RepositoryConnection,
    StorageError,
};
