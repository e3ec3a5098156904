//! The `AddData` / `GetData` façade over the codec and a record store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use envelope_storage::{Codec, RecordKey, RecordStore, StorageError, TypedValue};

use crate::ServiceError;

/// Stateless request handler: every call runs codec and store in sequence and
/// reports the first failure.
///
/// Store calls run under the optional deadline. When it expires, or when the
/// caller drops the returned future, the in-flight store call is dropped with
/// it.
#[derive(Clone)]
pub struct DataService {
    store: Arc<dyn RecordStore>,
    codec: Codec,
    deadline: Option<Duration>,
}

impl DataService {
    pub fn new(store: Arc<dyn RecordStore>, codec: Codec) -> Self {
        Self {
            store,
            codec,
            deadline: None,
        }
    }

    /// Bound every store call by `deadline`; `None` waits indefinitely.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Encode `value` and store it as a new record.
    ///
    /// Nothing is written when encoding fails. Repeated calls with the same
    /// value create distinct records.
    #[tracing::instrument(skip(self, value), fields(type_url = %value.type_url))]
    pub async fn add_data(&self, value: TypedValue) -> Result<RecordKey, ServiceError> {
        let document = self.codec.encode(&value).map_err(|err| {
            tracing::warn!(error = %err, "rejecting value");
            ServiceError::Encode(err)
        })?;

        let key = self.within_deadline(self.store.insert(document)).await?;
        tracing::debug!(%key, "stored value");
        Ok(key)
    }

    /// Fetch a record (by key, or the store's default selection) and decode it.
    #[tracing::instrument(skip(self), fields(key = key.map(RecordKey::as_str).unwrap_or("")))]
    pub async fn get_data(&self, key: Option<&RecordKey>) -> Result<TypedValue, ServiceError> {
        let record = match key {
            Some(key) => self.within_deadline(self.store.fetch_by_key(key)).await?,
            None => self.within_deadline(self.store.fetch_one()).await?,
        };

        let value = self.codec.decode(record.document).map_err(|err| {
            tracing::warn!(key = %record.key, error = %err, "stored document does not decode");
            ServiceError::Decode(err)
        })?;

        tracing::debug!(key = %record.key, type_url = %value.type_url, "loaded value");
        Ok(value)
    }

    /// Number of stored records.
    pub async fn record_count(&self) -> Result<u64, ServiceError> {
        self.within_deadline(self.store.count()).await
    }

    async fn within_deadline<T, F>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        let result = match self.deadline {
            Some(limit) => tokio::time::timeout(limit, operation).await.map_err(|_| {
                tracing::warn!(deadline_ms = limit.as_millis() as u64, "store call timed out");
                ServiceError::DeadlineExceeded(limit)
            })?,
            None => operation.await,
        };

        result.map_err(|err| {
            if err.is_transient() {
                tracing::warn!(error = %err, "store call failed");
            }
            ServiceError::from(err)
        })
    }
}
