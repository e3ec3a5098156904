//! Bounded retry of transient storage failures.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::{Document, Record, RecordKey, RecordStore, StorageError};

const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(2);

/// How many times to attempt a store operation and how long to wait between.
///
/// Backoff doubles after each failed attempt, capped at `max_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. `1` disables retry.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self::with_attempts(1)
    }

    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// A [`RecordStore`] that retries transient failures of the wrapped store.
///
/// Only [`StorageError::is_transient`] failures are retried; `NotFound`,
/// `Rejected`, serialization and configuration errors return immediately. A retried
/// `insert` whose first attempt reached the backend before failing can leave
/// an extra record behind.
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: RecordStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt_fn: F,
    ) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StorageError>> + Send,
        T: Send,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "store operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for RetryingStore<S> {
    async fn insert(&self, document: Document) -> Result<RecordKey, StorageError> {
        self.run("insert", || self.inner.insert(document.clone())).await
    }

    async fn fetch_one(&self) -> Result<Record, StorageError> {
        self.run("fetch_one", || self.inner.fetch_one()).await
    }

    async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError> {
        self.run("fetch_by_key", || self.inner.fetch_by_key(key)).await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.run("count", || self.inner.count()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times, then delegates.
    struct FlakyStore {
        inner: MemoryStore,
        failures: u32,
        rejects: bool,
        calls: AtomicU32,
    }

    impl FlakyStore {
        /// Fails with a transport error.
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures,
                rejects: false,
                calls: AtomicU32::new(0),
            }
        }

        /// Fails with a data rejection.
        fn rejecting(failures: u32) -> Self {
            Self {
                rejects: true,
                ..Self::new(failures)
            }
        }

        fn trip(&self) -> Result<(), StorageError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.failures {
                Ok(())
            } else if self.rejects {
                Err(StorageError::Rejected("unsupported Unicode escape sequence".into()))
            } else {
                Err(StorageError::StorageError("connection reset".into()))
            }
        }
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn insert(&self, document: Document) -> Result<RecordKey, StorageError> {
            self.trip()?;
            self.inner.insert(document).await
        }

        async fn fetch_one(&self) -> Result<Record, StorageError> {
            self.trip()?;
            self.inner.fetch_one().await
        }

        async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError> {
            self.trip()?;
            self.inner.fetch_by_key(key).await
        }

        async fn count(&self) -> Result<u64, StorageError> {
            self.trip()?;
            self.inner.count().await
        }
    }

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::with_attempts(attempts)
            .backoff(Duration::from_millis(1), Duration::from_millis(4))
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::with_attempts(5)
            .backoff(Duration::from_millis(10), Duration::from_millis(35));
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(20));
        assert_eq!(policy.delay_after(3), Duration::from_millis(35));
        assert_eq!(policy.delay_after(40), Duration::from_millis(35));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::with_attempts(0).max_attempts, 1);
        assert!(!RetryPolicy::default().is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_until_success() {
        let store = RetryingStore::new(FlakyStore::new(2), fast(3));
        let key = store.insert(Document::new()).await.unwrap();
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
        assert!(store.fetch_by_key(&key).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let store = RetryingStore::new(FlakyStore::new(10), fast(3));
        let err = store.count().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_not_retried() {
        let store = RetryingStore::new(FlakyStore::new(0), fast(5));
        let err = store.fetch_one().await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_data_is_not_retried() {
        let store = RetryingStore::new(FlakyStore::rejecting(1), fast(5));
        let err = store.insert(Document::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::Rejected(_)));
        assert!(!err.is_transient());
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner().inner.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn disabled_policy_makes_one_attempt() {
        let store = RetryingStore::new(FlakyStore::new(1), RetryPolicy::none());
        assert!(store.count().await.is_err());
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 1);
    }
}
