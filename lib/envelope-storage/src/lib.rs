//! Envelope Storage - store typed protobuf envelopes in schema-less document stores.
//!
//! This crate provides the codec and storage traits shared by every backend.
//!
//! # Core Concepts
//!
//! - **TypedValue**: A self-describing value, a type identifier plus the
//!   protobuf payload it names (wire-compatible with `google.protobuf.Any`).
//! - **Document**: The schema-less JSON mapping a TypedValue is persisted as.
//!   The type identifier travels in the reserved `@type` field.
//! - **Record**: One persisted Document with its generated key.
//!
//! # Traits
//!
//! - [`TypedMessage`]: Messages bound to a type identifier (derivable)
//! - [`Schema`]: Converts one message type between payload and document
//! - [`RecordStore`]: Single-record insert and fetch against a backend
//! - [`RepositoryConnection`]: Backend connection and collection setup

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

// Lets `#[derive(TypedMessage)]` expand inside this crate.
extern crate self as envelope_storage;

mod codec;
mod envelope;
mod error;
pub mod json_double;
mod memory;
mod record;
mod repository;
mod retry;
mod schema;
mod time;
pub mod well_known;

pub use codec::Codec;
pub use envelope::{TypedMessage, TypedValue, full_name};
pub use error::{CodecError, StorageError};
pub use memory::MemoryStore;
pub use record::{Document, Record, RecordKey, TYPE_FIELD, validate_collection_name};
pub use repository::{ConnectionConfig, DEFAULT_COLLECTION, RecordStore, RepositoryConnection};
pub use retry::{RetryPolicy, RetryingStore};
pub use schema::{MessageSchema, Schema, SchemaRegistry};
pub use time::StorageDatetime;

// Re-export derive macro
pub use envelope_storage_derive::TypedMessage;
