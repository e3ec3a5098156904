//! Server configuration from command-line flags and environment.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use envelope_storage::{ConnectionConfig, RetryPolicy, validate_collection_name};

use crate::ServiceError;

/// Backend selected by the store URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `memory://`, records vanish with the process.
    Memory,
    /// `ws://` or `wss://`
    Surreal,
    /// `postgres://` or `postgresql://`
    Postgres,
}

impl StoreBackend {
    pub fn from_url(url: &str) -> Result<Self, ServiceError> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| ServiceError::Config(format!("store URL {:?} has no scheme", url)))?;

        match scheme.as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "ws" | "wss" => Ok(StoreBackend::Surreal),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(ServiceError::Config(format!(
                "unsupported store scheme {:?} (expected memory, ws, wss, postgres)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "envelope-storage",
    version,
    about = "Store and retrieve typed protobuf envelopes in a document database"
)]
pub struct ServeConfig {
    /// Address the RPC listener binds to.
    #[arg(long, env = "ENVELOPE_LISTEN", default_value = "127.0.0.1:50051")]
    pub listen: SocketAddr,

    /// Document store: memory://, ws://host:port (SurrealDB), postgres://...
    #[arg(long, env = "ENVELOPE_STORE_URL", default_value = "memory://")]
    pub store_url: String,

    /// SurrealDB namespace.
    #[arg(long, env = "ENVELOPE_NAMESPACE", default_value = "envelope")]
    pub namespace: String,

    /// SurrealDB database.
    #[arg(long, env = "ENVELOPE_DATABASE", default_value = "envelope")]
    pub database: String,

    /// Collection (table) holding the records.
    #[arg(long, env = "ENVELOPE_COLLECTION", default_value = envelope_storage::DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long, env = "ENVELOPE_STORE_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "ENVELOPE_STORE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Per-store-call deadline in milliseconds; 0 disables it.
    #[arg(long, env = "ENVELOPE_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// Attempts per store call; values above 1 retry transient failures.
    #[arg(long, env = "ENVELOPE_STORE_RETRIES", default_value_t = 1)]
    pub store_retries: u32,

    #[arg(long, env = "ENVELOPE_MAX_BODY_BYTES", default_value_t = 4 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Message name used to decode stored documents that lack "@type".
    #[arg(long, env = "ENVELOPE_DEFAULT_TYPE")]
    pub default_type: Option<String>,
}

impl ServeConfig {
    /// Check flag combinations and return the selected backend.
    pub fn validate(&self) -> Result<StoreBackend, ServiceError> {
        if self.store_retries == 0 {
            return Err(ServiceError::Config(
                "--store-retries must be at least 1".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ServiceError::Config(
                "--max-body-bytes must be greater than zero".to_string(),
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ServiceError::Config(
                "--username and --password must be given together".to_string(),
            ));
        }
        validate_collection_name(&self.collection)
            .map_err(|err| ServiceError::Config(err.to_string()))?;

        StoreBackend::from_url(&self.store_url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(self.store_retries)
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(self.store_url.clone())
            .namespace(self.namespace.clone())
            .database(self.database.clone())
            .collection(self.collection.clone());
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            config = config.credentials(username.clone(), password.clone());
        }
        config
    }
}
