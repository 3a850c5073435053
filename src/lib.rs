//! Mango API: schema-validated resource modules over a document store, served by axum.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod resources;
pub mod response;
pub mod routes;
pub mod service;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod telemetry;

pub use app::{bootstrap, router, run, HttpOptions, Server};
pub use config::{AppConfig, DatabaseTarget, EntitySchema, Environment, FieldSpec};
pub use error::{AppError, ConfigError, StartupError, StoreError};
pub use resources::{ResourceDef, ResourceRegistry};
pub use response::Envelope;
pub use service::{DocumentRepository, Repository, SchemaValidator};
pub use shutdown::{Outcome, Phase, Shutdown, Trigger};
pub use state::AppState;
pub use store::{Document, DocumentStore, MemoryStore, PgDocumentStore};
