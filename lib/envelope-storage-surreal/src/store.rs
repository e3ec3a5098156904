//! SurrealDB implementation of RecordStore.
//!
//! Records live in one schemaless table (the collection). Each row holds the
//! generated key, the creation timestamp, and the document as JSON text under
//! `document`.

use async_trait::async_trait;
use envelope_storage::{
    ConnectionConfig, Document, Record, RecordKey, RecordStore, RepositoryConnection,
    StorageDatetime, StorageError, validate_collection_name,
};
use serde::{Deserialize, Serialize};
use surrealdb::engine::remote::ws::{Client, Ws, Wss};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};

/// Namespace used when the connection config names none.
pub const DEFAULT_NAMESPACE: &str = "envelope";

/// Database used when the connection config names none.
pub const DEFAULT_DATABASE: &str = "envelope";

/// Helper struct for deserializing count() results from SurrealDB.
#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

/// Row layout in SurrealDB. Field names avoid SurrealQL keywords.
///
/// The document is kept as JSON text. SurrealDB numbers are `i64` or `f64`,
/// so an integer above `i64::MAX` would not survive as a native value.
#[derive(Debug, Serialize, Deserialize)]
struct SurrealRow {
    record_key: String,
    created_at: StorageDatetime,
    document: String,
}

impl SurrealRow {
    fn from_record(record: Record) -> Result<Self, StorageError> {
        Ok(Self {
            record_key: record.key.into_inner(),
            created_at: record.created_at,
            document: serde_json::to_string(&record.document)?,
        })
    }

    fn into_record(self) -> Result<Record, StorageError> {
        Ok(Record {
            key: RecordKey::from(self.record_key),
            created_at: self.created_at,
            document: serde_json::from_str(&self.document)?,
        })
    }
}

// Table names are wrapped in backticks so reserved words stay identifiers.

pub(crate) fn define_table_sql(table: &str) -> String {
    format!(
        "DEFINE TABLE IF NOT EXISTS `{table}` SCHEMALESS; \
         DEFINE INDEX IF NOT EXISTS `{table}_record_key` ON TABLE `{table}` FIELDS record_key UNIQUE;"
    )
}

pub(crate) fn insert_sql(table: &str) -> String {
    format!("INSERT INTO `{table}` $row")
}

pub(crate) fn select_latest_sql(table: &str) -> String {
    format!(
        "SELECT record_key, created_at, document FROM `{table}` \
         ORDER BY created_at DESC, record_key DESC LIMIT 1"
    )
}

pub(crate) fn select_by_key_sql(table: &str) -> String {
    format!("SELECT record_key, created_at, document FROM `{table}` WHERE record_key = $key LIMIT 1")
}

pub(crate) fn count_sql(table: &str) -> String {
    format!("SELECT count() FROM `{table}` GROUP ALL")
}

fn storage_error(e: surrealdb::Error) -> StorageError {
    StorageError::StorageError(e.to_string())
}

/// Remote address and TLS choice from a `ws://` / `wss://` URL.
///
/// The SurrealDB client appends the `/rpc` path itself, so a trailing `/rpc`
/// is dropped.
pub(crate) fn split_ws_url(url: &str) -> Result<(bool, &str), StorageError> {
    let (secure, rest) = if let Some(rest) = url.strip_prefix("wss://") {
        (true, rest)
    } else if let Some(rest) = url.strip_prefix("ws://") {
        (false, rest)
    } else {
        return Err(StorageError::InvalidConfig(format!(
            "SurrealDB URL must start with ws:// or wss://, got {:?}",
            url
        )));
    };

    let rest = rest.trim_end_matches('/');
    let address = rest.strip_suffix("/rpc").unwrap_or(rest);
    if address.is_empty() {
        return Err(StorageError::InvalidConfig(format!(
            "SurrealDB URL {:?} has no host",
            url
        )));
    }
    Ok((secure, address))
}

/// `RecordStore` backed by one SurrealDB table.
///
/// Generic over the SurrealDB engine: remote deployments use the WebSocket
/// `Client` (see [`RepositoryConnection::connect`]); embedded engines work
/// through [`SurrealStore::new`].
#[derive(Clone)]
pub struct SurrealStore<C: Connection = Client> {
    db: Surreal<C>,
    table: String,
}

impl<C: Connection> SurrealStore<C> {
    /// Wrap a client whose namespace and database are already selected.
    pub fn new(db: Surreal<C>, table: impl Into<String>) -> Result<Self, StorageError> {
        let table = table.into();
        validate_collection_name(&table)?;
        Ok(Self { db, table })
    }

    /// Get the inner Surreal client.
    pub fn inner(&self) -> &Surreal<C> {
        &self.db
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Define the table and its key index if missing.
    pub async fn define_table(&self) -> Result<(), StorageError> {
        self.db
            .query(define_table_sql(&self.table))
            .await
            .map_err(storage_error)?
            .check()
            .map_err(storage_error)?;

        tracing::debug!(table = %self.table, "defined table");
        Ok(())
    }

    async fn select_one(
        &self,
        sql: String,
        key: Option<&RecordKey>,
    ) -> Result<Option<Record>, StorageError> {
        let mut q = self.db.query(sql);
        if let Some(key) = key {
            q = q.bind(("key", key.as_str().to_owned()));
        }

        let rows: Vec<SurrealRow> = q
            .await
            .map_err(storage_error)?
            .take(0)
            .map_err(storage_error)?;

        rows.into_iter().next().map(SurrealRow::into_record).transpose()
    }
}

#[async_trait]
impl<C: Connection> RecordStore for SurrealStore<C> {
    async fn insert(&self, document: Document) -> Result<RecordKey, StorageError> {
        let record = Record::new(document);
        let key = record.key.clone();
        let row = SurrealRow::from_record(record)?;

        self.db
            .query(insert_sql(&self.table))
            .bind(("row", row))
            .await
            .map_err(storage_error)?
            .check()
            .map_err(storage_error)?;

        tracing::debug!(table = %self.table, %key, "inserted record");
        Ok(key)
    }

    async fn fetch_one(&self) -> Result<Record, StorageError> {
        self.select_one(select_latest_sql(&self.table), None)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("table {} is empty", self.table)))
    }

    async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError> {
        self.select_one(select_by_key_sql(&self.table), Some(key))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("record {}", key)))
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let result: Option<CountResult> = self
            .db
            .query(count_sql(&self.table))
            .await
            .map_err(storage_error)?
            .take(0)
            .map_err(storage_error)?;

        Ok(result.map(|r| r.count).unwrap_or(0))
    }
}

#[async_trait]
impl RepositoryConnection for SurrealStore<Client> {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, StorageError> {
        let config = config.into();
        let table = config.collection_or_default().to_string();
        validate_collection_name(&table)?;

        let (secure, address) = split_ws_url(&config.url)?;
        let db = if secure {
            Surreal::new::<Wss>(address).await
        } else {
            Surreal::new::<Ws>(address).await
        }
        .map_err(storage_error)?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await
            .map_err(storage_error)?;
        }

        let namespace = config.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let database = config.database.as_deref().unwrap_or(DEFAULT_DATABASE);
        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(storage_error)?;

        tracing::info!(%address, namespace, database, %table, "connected to SurrealDB");
        Ok(Self { db, table })
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        self.define_table().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_ws_urls() {
        assert_eq!(split_ws_url("ws://localhost:8000").unwrap(), (false, "localhost:8000"));
        assert_eq!(split_ws_url("wss://db.example:443/").unwrap(), (true, "db.example:443"));
        assert_eq!(split_ws_url("ws://127.0.0.1:8000/rpc").unwrap(), (false, "127.0.0.1:8000"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            split_ws_url("http://localhost:8000").unwrap_err(),
            StorageError::InvalidConfig(_)
        ));
        assert!(matches!(
            split_ws_url("ws://").unwrap_err(),
            StorageError::InvalidConfig(_)
        ));
    }

    #[test]
    fn statements_quote_the_table() {
        assert_eq!(
            define_table_sql("order"),
            "DEFINE TABLE IF NOT EXISTS `order` SCHEMALESS; \
             DEFINE INDEX IF NOT EXISTS `order_record_key` ON TABLE `order` FIELDS record_key UNIQUE;"
        );
        assert_eq!(insert_sql("select"), "INSERT INTO `select` $row");
        assert!(select_latest_sql("user").contains("FROM `user` ORDER BY"));
        assert!(select_by_key_sql("user").contains("FROM `user` WHERE record_key = $key"));
        assert_eq!(count_sql("t"), "SELECT count() FROM `t` GROUP ALL");
    }

    #[test]
    fn row_keeps_record_fields() {
        let mut document = Document::new();
        document.insert("@type".into(), serde_json::json!("t/x.Y"));
        document.insert("big".into(), serde_json::json!(u64::MAX));
        let record = Record::new(document);

        let row = SurrealRow::from_record(record.clone()).unwrap();
        assert_eq!(row.record_key, record.key.as_str());
        assert_eq!(row.document, r#"{"@type":"t/x.Y","big":18446744073709551615}"#);
        assert_eq!(row.into_record().unwrap(), record);
    }

    #[test]
    fn unreadable_row_is_a_serialization_error() {
        let row = SurrealRow {
            record_key: "k".to_string(),
            created_at: StorageDatetime::now(),
            document: "not json".to_string(),
        };
        assert!(matches!(
            row.into_record().unwrap_err(),
            StorageError::SerializationError(_)
        ));
    }
}
