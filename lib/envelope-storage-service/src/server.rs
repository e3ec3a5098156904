//! Server bootstrap: tracing, store connection, listener, graceful shutdown.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use envelope_storage::{
    Codec, MemoryStore, RecordStore, RepositoryConnection, RetryingStore, SchemaRegistry,
};
use envelope_storage_postgres::PgStore;
use envelope_storage_surreal::SurrealStore;
use tracing_subscriber::EnvFilter;

use crate::config::{ServeConfig, StoreBackend};
use crate::{DataService, ServiceError, rpc};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Connect the configured backend, creating its collection if needed.
pub async fn open_store(
    config: &ServeConfig,
    backend: StoreBackend,
) -> Result<Arc<dyn RecordStore>, ServiceError> {
    let store: Arc<dyn RecordStore> = match backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Surreal => {
            let store: SurrealStore = SurrealStore::connect(config.connection_config()).await?;
            store.initialize().await?;
            Arc::new(store)
        }
        StoreBackend::Postgres => {
            let store = PgStore::connect(config.connection_config()).await?;
            store.initialize().await?;
            Arc::new(store)
        }
    };

    let policy = config.retry_policy();
    if policy.is_enabled() {
        tracing::info!(max_attempts = policy.max_attempts, "store retries enabled");
        return Ok(Arc::new(RetryingStore::new(store, policy)));
    }
    Ok(store)
}

/// Schemas the server can encode and decode.
pub fn schema_registry(config: &ServeConfig) -> Result<SchemaRegistry, ServiceError> {
    let mut registry = SchemaRegistry::with_well_known();
    if let Some(default_type) = &config.default_type {
        registry
            .set_default_schema(default_type)
            .map_err(|err| ServiceError::Config(format!("--default-type: {}", err)))?;
    }
    Ok(registry)
}

/// Serve with the built-in schemas until Ctrl-C or SIGTERM.
pub async fn serve(config: ServeConfig) -> Result<(), ServiceError> {
    let registry = schema_registry(&config)?;
    serve_with_registry(config, registry).await
}

/// Serve with a caller-supplied schema registry.
pub async fn serve_with_registry(
    config: ServeConfig,
    registry: SchemaRegistry,
) -> Result<(), ServiceError> {
    let backend = config.validate()?;

    init_tracing();

    let store = open_store(&config, backend).await?;
    tracing::info!(
        backend = ?backend,
        collection = %config.collection,
        schemas = ?registry.names(),
        "store ready"
    );

    let service = DataService::new(store, Codec::new(registry))
        .with_deadline(config.request_timeout());
    let app = rpc::router(service, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(listen = %config.listen, "serving envelope.DataService");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutting down");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ServiceError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "server shutdown timed out",
                    )));
                }
            }
        }
    };
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}
