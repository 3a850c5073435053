//! Repository contract, schema validation and their document-store implementation.

mod repository;
mod validation;
pub use repository::{parse_id, DocumentRepository, Repository};
pub use validation::SchemaValidator;
