//! PostgreSQL document store: one JSONB table per collection.

use super::{Document, DocumentStore};
use crate::config::{is_collection_name, SortKey};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

type DocRow = (Uuid, Value, DateTime<Utc>, DateTime<Utc>);

const RETURNING: &str = "id, doc, created_at, updated_at";

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create the target database if needed, then open the pool. The first connection is
    /// established eagerly so an unreachable server fails here rather than on first request.
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        tokio::time::timeout(connect_timeout, ensure_database_exists(&options))
            .await
            .map_err(|_| StoreError::Db(sqlx::Error::PoolTimedOut))??;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect_with(options)
            .await?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(PgDocumentStore { pool })
    }
}

/// Quote identifier for PostgreSQL (names are validated collection names only).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn table(collection: &str) -> Result<String, StoreError> {
    if !is_collection_name(collection) {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(quoted(collection))
}

fn row_to_document(collection: &str, row: DocRow) -> Result<Document, StoreError> {
    let (id, doc, created_at, updated_at) = row;
    match doc {
        Value::Object(fields) => Ok(Document {
            id,
            fields,
            created_at,
            updated_at,
        }),
        other => Err(StoreError::Malformed {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: format!("expected object, found {}", json_type(&other)),
        }),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let t = table(collection)?;
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            t
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        let index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (created_at)",
            quoted(&format!("{}_created_at_idx", collection)),
            t
        );
        sqlx::query(&index).execute(&self.pool).await?;
        tracing::debug!(collection, "collection ready");
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Document, StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, doc, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) RETURNING {}",
            table(collection)?,
            RETURNING
        );
        tracing::debug!(sql = %sql, "query");
        let row: DocRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(Value::Object(fields))
            .fetch_one(&self.pool)
            .await?;
        row_to_document(collection, row)
    }

    async fn find_all(&self, collection: &str, sort: &SortKey) -> Result<Vec<Document>, StoreError> {
        let t = table(collection)?;
        let rows: Vec<DocRow> = match sort {
            SortKey::CreatedAt => {
                let sql = format!("SELECT {} FROM {} ORDER BY created_at, id", RETURNING, t);
                tracing::debug!(sql = %sql, "query");
                sqlx::query_as(&sql).fetch_all(&self.pool).await?
            }
            SortKey::Field(key) => {
                let sql = format!(
                    "SELECT {} FROM {} ORDER BY doc -> $1::text ASC NULLS FIRST, created_at, id",
                    RETURNING, t
                );
                tracing::debug!(sql = %sql, key = %key, "query");
                sqlx::query_as(&sql).bind(key).fetch_all(&self.pool).await?
            }
        };
        rows.into_iter().map(|r| row_to_document(collection, r)).collect()
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", RETURNING, table(collection)?);
        tracing::debug!(sql = %sql, %id, "query");
        let row: Option<DocRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| row_to_document(collection, r)).transpose()
    }

    async fn replace_by_id(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "UPDATE {} SET doc = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            table(collection)?,
            RETURNING
        );
        tracing::debug!(sql = %sql, %id, "query");
        let row: Option<DocRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(Value::Object(fields))
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_document(collection, r)).transpose()
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING {}", table(collection)?, RETURNING);
        tracing::debug!(sql = %sql, %id, "query");
        let row: Option<DocRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| row_to_document(collection, r)).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("postgres pool closed");
    }
}

/// Ensure the database named in `options` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(options: &PgConnectOptions) -> Result<(), StoreError> {
    let db_name = options.get_database().unwrap_or("").to_string();
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let mut conn = options.clone().database("postgres").connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}
