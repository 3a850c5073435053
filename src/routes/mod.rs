//! Route table: common routes plus every registered resource under its own prefix.

mod common;
mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::handlers::fallback;
use crate::resources::ResourceRegistry;
use crate::state::AppState;
use axum::Router;

/// Mount each resource at `/<path_segment>`. Registration order is irrelevant;
/// prefixes are unique by construction of the registry.
pub fn api_routes(registry: &ResourceRegistry) -> Router<AppState> {
    registry.iter().fold(Router::new(), |router, def| {
        router.nest(&format!("/{}", def.path_segment), resource_routes(def.clone()))
    })
}

/// Full route table, still waiting for its state.
pub fn app_routes(registry: &ResourceRegistry) -> Router<AppState> {
    common_routes()
        .merge(api_routes(registry))
        .fallback(fallback::not_found)
}
