//! In-process document store for tests and local development (`DATABASE_URL=memory://`).

use super::{compare_values, Document, DocumentStore};
use crate::config::SortKey;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Collections keep insertion order so `SortKey::CreatedAt` is a plain scan.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection (0 when it does not exist).
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.check_open()?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Document, StoreError> {
        self.check_open()?;
        let mut guard = self.collections.write().await;
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4(),
            fields,
            created_at: now,
            updated_at: now,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_all(&self, collection: &str, sort: &SortKey) -> Result<Vec<Document>, StoreError> {
        self.check_open()?;
        let guard = self.collections.read().await;
        let mut docs = guard
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?
            .clone();
        if let SortKey::Field(key) = sort {
            // stable sort keeps creation order among equal keys
            docs.sort_by(|a, b| compare_values(a.fields.get(key), b.fields.get(key)));
        }
        Ok(docs)
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.check_open()?;
        let guard = self.collections.read().await;
        let docs = guard
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(docs.iter().find(|d| d.id == id).cloned())
    }

    async fn replace_by_id(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        self.check_open()?;
        let mut guard = self.collections.write().await;
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(docs.iter_mut().find(|d| d.id == id).map(|doc| {
            doc.fields = fields;
            doc.updated_at = Utc::now();
            doc.clone()
        }))
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.check_open()?;
        let mut guard = self.collections.write().await;
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(docs.iter().position(|d| d.id == id).map(|i| docs.remove(i)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_open()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
