//! Document store seam: per-collection CRUD primitives over JSON documents.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgDocumentStore};

use crate::config::{AppConfig, DatabaseTarget, SortKey};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgConnectOptions;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// A persisted entity: store-assigned identity and timestamps around the schema fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Idempotent. Called once per registered resource at startup.
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError>;

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Document, StoreError>;

    async fn find_all(&self, collection: &str, sort: &SortKey) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Replace the fields of an existing document and bump `updated_at`. None when absent.
    async fn replace_by_id(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    /// Remove and return the document. None when absent.
    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

/// Open the store named by the configuration. Fails when the database is unreachable.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.database {
        DatabaseTarget::Memory => {
            tracing::info!("using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseTarget::Url(url) => {
            let options = PgConnectOptions::from_str(url)?;
            let store = PgDocumentStore::connect(options, config.db_max_connections, config.db_connect_timeout).await?;
            Ok(Arc::new(store))
        }
        DatabaseTarget::Parts {
            host,
            port,
            user,
            password,
            database,
        } => {
            let mut options = PgConnectOptions::new()
                .host(host)
                .username(user)
                .password(password)
                .database(database);
            if let Some(port) = port {
                options = options.port(*port);
            }
            let store = PgDocumentStore::connect(options, config.db_max_connections, config.db_connect_timeout).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Total order over JSON values for field sorting, following jsonb's cross-type order:
/// missing and null first, then strings, numbers, booleans, arrays, objects.
/// Strings compare bytewise here; PostgreSQL uses the database collation.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_serializes_flat() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Haden"));
        let doc = Document {
            id,
            fields,
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["id"], json!(id.to_string()));
        assert_eq!(v["name"], json!("Haden"));
        assert!(v["created_at"].is_string());
    }

    #[test]
    fn values_order_by_type_then_content() {
        let one = json!(1);
        let two = json!(2.5);
        let a = json!("a");
        assert_eq!(compare_values(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(compare_values(None, Some(&one)), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Null), Some(&a)), Ordering::Less);
        assert_eq!(compare_values(Some(&a), Some(&a)), Ordering::Equal);
    }

    #[test]
    fn mixed_types_follow_jsonb_order() {
        let mut values = vec![json!(true), json!(3), json!("kent"), Value::Null, json!([1]), json!({})];
        values.sort_by(|x, y| compare_values(Some(x), Some(y)));
        assert_eq!(
            values,
            vec![Value::Null, json!("kent"), json!(3), json!(true), json!([1]), json!({})]
        );
        assert_eq!(compare_values(Some(&json!(false)), Some(&json!(2.5))), Ordering::Greater);
    }
}
