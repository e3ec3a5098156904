//! PostgreSQL implementation for envelope-storage.
//!
//! Each record is one row of a single table, with the document kept as
//! `JSON` text:
//!
//! ```text
//! key TEXT PRIMARY KEY | created_at TIMESTAMPTZ | document JSON
//! ```
//!
//! # Usage
//!
//! ```text
//! use envelope_storage::{ConnectionConfig, RepositoryConnection};
//! use envelope_storage_postgres::PgStore;
//!
//! let config = ConnectionConfig::new("postgres://localhost/envelope").collection("records");
//! let store = PgStore::connect(config).await?;
//! store.initialize().await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod store;

pub use store::PgStore;

// Re-export core types for convenience
pub use envelope_storage::{
    ConnectionConfig, Document, Record, RecordKey, RecordStore, RepositoryConnection,
    StorageError,
};
