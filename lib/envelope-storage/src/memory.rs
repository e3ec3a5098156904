//! In-process `RecordStore`, used by tests and the `memory://` backend.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Document, Record, RecordKey, RecordStore, StorageError};

/// Records held in memory for the life of the process.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prepared record as-is, keeping its key and timestamp.
    pub async fn insert_record(&self, record: Record) {
        self.records.write().await.push(record);
    }

    /// Snapshot of every record in insertion order.
    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, document: Document) -> Result<RecordKey, StorageError> {
        let record = Record::new(document);
        let key = record.key.clone();
        self.records.write().await.push(record);
        tracing::debug!(%key, "inserted record");
        Ok(key)
    }

    async fn fetch_one(&self) -> Result<Record, StorageError> {
        let records = self.records.read().await;
        records
            .iter()
            .reduce(|newest, record| {
                if record.is_newer_than(newest) {
                    record
                } else {
                    newest
                }
            })
            .cloned()
            .ok_or_else(|| StorageError::NotFound("collection is empty".to_string()))
    }

    async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|record| &record.key == key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("record {}", key)))
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.records.read().await.len() as u64)
    }
}
