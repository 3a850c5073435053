//! The five standard routes of one resource, relative to its mount prefix.

use crate::handlers::fallback::method_not_allowed;
use crate::handlers::resource::{create, delete as delete_handler, list, read, update};
use crate::resources::ResourceDef;
use crate::state::AppState;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

/// POST / create, GET / list, GET /:id read, PATCH /:id update, DELETE /:id delete.
/// Any other method on these paths gets a 405 envelope.
pub fn resource_routes(resource: Arc<ResourceDef>) -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create).fallback(method_not_allowed))
        .route(
            "/:id",
            get(read)
                .patch(update)
                .delete(delete_handler)
                .fallback(method_not_allowed),
        )
        .layer(Extension(resource))
}
