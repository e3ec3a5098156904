//! PostgreSQL implementation of RecordStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envelope_storage::{
    ConnectionConfig, Document, Record, RecordKey, RecordStore, RepositoryConnection,
    StorageError, validate_collection_name,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::Row;
use std::ops::Deref;

const DEFAULT_MAX_CONNECTIONS: u32 = 16;

/// SQLSTATE classes for bad data (22) and constraint violations (23).
fn is_data_rejection(sqlstate: &str) -> bool {
    sqlstate.starts_with("22") || sqlstate.starts_with("23")
}

fn storage_error(e: sqlx::Error) -> StorageError {
    let rejected = match &e {
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_data_rejection(&code)),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => true,
        _ => false,
    };

    if rejected {
        StorageError::Rejected(e.to_string())
    } else {
        StorageError::StorageError(e.to_string())
    }
}

// Table names are double-quoted so reserved words stay identifiers. The
// document column is `JSON` rather than `JSONB`: it keeps the text as
// written, including `\u0000` escapes that `JSONB` refuses.

/// DDL for the records table and its recency index.
pub(crate) fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (\
         key TEXT PRIMARY KEY, \
         created_at TIMESTAMPTZ NOT NULL, \
         document JSON NOT NULL)"
    )
}

pub(crate) fn create_index_sql(table: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS \"{table}_created_at_idx\" ON \"{table}\" (created_at DESC, key DESC)"
    )
}

pub(crate) fn insert_sql(table: &str) -> String {
    format!("INSERT INTO \"{table}\" (key, created_at, document) VALUES ($1, $2, $3::json)")
}

pub(crate) fn select_latest_sql(table: &str) -> String {
    format!(
        "SELECT key, created_at, document::text AS document FROM \"{table}\" \
         ORDER BY created_at DESC, key DESC LIMIT 1"
    )
}

pub(crate) fn select_by_key_sql(table: &str) -> String {
    format!("SELECT key, created_at, document::text AS document FROM \"{table}\" WHERE key = $1")
}

pub(crate) fn count_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM \"{table}\"")
}

fn deserialize_row(row: &PgRow) -> Result<Record, StorageError> {
    let key: String = row.try_get("key").map_err(storage_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage_error)?;
    let document: String = row.try_get("document").map_err(storage_error)?;

    Ok(Record {
        key: RecordKey::from(key),
        created_at: created_at.into(),
        document: serde_json::from_str::<Document>(&document)?,
    })
}

/// `RecordStore` keeping each record as a JSON row in one table.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: sqlx::PgPool,
    table: String,
}

impl PgStore {
    /// Create a store from an existing sqlx pool.
    pub fn new(pool: sqlx::PgPool, table: impl Into<String>) -> Result<Self, StorageError> {
        let table = table.into();
        validate_collection_name(&table)?;
        Ok(Self { pool, table })
    }

    /// Get the inner sqlx::PgPool.
    pub fn inner(&self) -> &sqlx::PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Deref for PgStore {
    type Target = sqlx::PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert(&self, document: Document) -> Result<RecordKey, StorageError> {
        let record = Record::new(document);
        let document = serde_json::to_string(&record.document)?;

        sqlx::query(&insert_sql(&self.table))
            .bind(record.key.as_str())
            .bind(*record.created_at.inner())
            .bind(document)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        tracing::debug!(table = %self.table, key = %record.key, "inserted record");
        Ok(record.key)
    }

    async fn fetch_one(&self) -> Result<Record, StorageError> {
        let row = sqlx::query(&select_latest_sql(&self.table))
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| StorageError::NotFound(format!("table {} is empty", self.table)))?;

        deserialize_row(&row)
    }

    async fn fetch_by_key(&self, key: &RecordKey) -> Result<Record, StorageError> {
        let row = sqlx::query(&select_by_key_sql(&self.table))
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| StorageError::NotFound(format!("record {}", key)))?;

        deserialize_row(&row)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query(&count_sql(&self.table))
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        let count: i64 = row.try_get(0).map_err(storage_error)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl RepositoryConnection for PgStore {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, StorageError> {
        let config = config.into();
        let table = config.collection_or_default().to_string();
        validate_collection_name(&table)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
            .connect(&config.url)
            .await
            .map_err(storage_error)?;

        tracing::info!(%table, "connected to PostgreSQL");
        Ok(Self { pool, table })
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        sqlx::query(&create_index_sql(&self.table))
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        tracing::debug!(table = %self.table, "created table");
        Ok(())
    }
}
