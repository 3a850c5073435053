//! HTTP handlers for resource CRUD, plus fallbacks.

pub mod fallback;
pub mod resource;
