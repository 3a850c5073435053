//! Application context shared by all routes: store handle and resource registry.

use crate::config::Environment;
use crate::resources::{ResourceDef, ResourceRegistry};
use crate::service::{DocumentRepository, Repository};
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Acquired once at startup, closed during shutdown.
    pub store: Arc<dyn DocumentStore>,
    pub registry: Arc<ResourceRegistry>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, registry: ResourceRegistry, environment: Environment) -> Self {
        AppState {
            store,
            registry: Arc::new(registry),
            environment,
        }
    }

    /// Create every registered collection in the store.
    pub async fn ensure_collections(&self) -> Result<(), crate::error::StoreError> {
        for def in self.registry.iter() {
            self.store.ensure_collection(def.collection).await?;
        }
        Ok(())
    }

    pub fn repository(&self, resource: &Arc<ResourceDef>) -> Arc<dyn Repository> {
        Arc::new(DocumentRepository::new(resource.clone(), self.store.clone()))
    }
}
