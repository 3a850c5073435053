//! Resource modules and the registry that mounts them.
//!
//! A resource is a schema plus the names it is exposed under. Adding one means
//! writing a `definition()` and registering it; nothing else changes.

pub mod mango;
pub mod order;
pub mod user;

use crate::config::{validate_resource, EntitySchema};
use crate::error::ConfigError;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ResourceDef {
    /// Singular display name used in response messages, e.g. "Mango".
    pub name: &'static str,
    /// Plural display name, e.g. "Mangoes".
    pub plural: &'static str,
    /// Mount prefix without the leading slash, e.g. "mango".
    pub path_segment: &'static str,
    /// Store collection name.
    pub collection: &'static str,
    pub schema: EntitySchema,
}

/// Immutable after startup.
#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<ResourceDef>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mango, orders and users.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.register(mango::definition())?;
        registry.register(order::definition())?;
        registry.register(user::definition())?;
        Ok(registry)
    }

    /// Validate and add a resource. Prefixes and collections must be unique.
    pub fn register(&mut self, def: ResourceDef) -> Result<(), ConfigError> {
        validate_resource(&def)?;
        let segments: HashSet<&str> = self.resources.iter().map(|r| r.path_segment).collect();
        if segments.contains(def.path_segment) {
            return Err(ConfigError::DuplicatePathSegment(def.path_segment.to_string()));
        }
        if self.resources.iter().any(|r| r.collection == def.collection) {
            return Err(ConfigError::DuplicateCollection(def.collection.to_string()));
        }
        tracing::debug!(resource = def.name, prefix = def.path_segment, "registered resource");
        self.resources.push(Arc::new(def));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDef>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
