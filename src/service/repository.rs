//! The five-operation repository contract and its schema-driven implementation.

use crate::error::AppError;
use crate::resources::ResourceDef;
use crate::service::SchemaValidator;
use crate::store::{Document, DocumentStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Create, list, get, update and delete for one resource. Every failure is an explicit
/// `AppError` kind so the controller's status mapping stays a pure function.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create(&self, input: Map<String, Value>) -> Result<Document, AppError>;

    /// Empty vec, not an error, when nothing exists.
    async fn list(&self) -> Result<Vec<Document>, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Document, AppError>;

    async fn update_by_id(&self, id: &str, patch: Map<String, Value>) -> Result<Document, AppError>;

    /// Returns the document as it was before deletion. A second delete is `NotFound`.
    async fn delete_by_id(&self, id: &str) -> Result<Document, AppError>;
}

/// Malformed identifiers are distinct from unknown ones.
pub fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str.trim()).map_err(|_| AppError::InvalidIdentifier(id_str.to_string()))
}

/// Validates through the resource schema and persists in the resource's collection.
pub struct DocumentRepository {
    resource: Arc<ResourceDef>,
    store: Arc<dyn DocumentStore>,
}

impl DocumentRepository {
    pub fn new(resource: Arc<ResourceDef>, store: Arc<dyn DocumentStore>) -> Self {
        DocumentRepository { resource, store }
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::NotFound(format!("{} {}", self.resource.name, id))
    }
}

#[async_trait]
impl Repository for DocumentRepository {
    async fn create(&self, input: Map<String, Value>) -> Result<Document, AppError> {
        let fields = SchemaValidator::validate(&self.resource.schema, &input)?;
        let doc = self.store.insert(self.resource.collection, fields).await?;
        tracing::info!(resource = self.resource.name, id = %doc.id, "created");
        Ok(doc)
    }

    async fn list(&self) -> Result<Vec<Document>, AppError> {
        let docs = self
            .store
            .find_all(self.resource.collection, &self.resource.schema.sort_key)
            .await?;
        Ok(docs)
    }

    async fn get_by_id(&self, id: &str) -> Result<Document, AppError> {
        let id = parse_id(id)?;
        self.store
            .find_by_id(self.resource.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    async fn update_by_id(&self, id: &str, patch: Map<String, Value>) -> Result<Document, AppError> {
        let id = parse_id(id)?;
        let existing = self
            .store
            .find_by_id(self.resource.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        let fields = SchemaValidator::validate_merged(&self.resource.schema, &existing.fields, &patch)?;
        // Concurrent writers race here; the last replace wins.
        let doc = self
            .store
            .replace_by_id(self.resource.collection, id, fields)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        tracing::info!(resource = self.resource.name, %id, "updated");
        Ok(doc)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Document, AppError> {
        let id = parse_id(id)?;
        let doc = self
            .store
            .delete_by_id(self.resource.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        tracing::info!(resource = self.resource.name, %id, "deleted");
        Ok(doc)
    }
}
