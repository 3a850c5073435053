//! Common routes: liveness, health, readiness, version.

use crate::error::ErrorDetail;
use crate::response::Envelope;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

async fn welcome() -> Json<Envelope<()>> {
    Json(Envelope::message_only("Welcome to the Mango API"))
}

async fn health() -> Json<Envelope<()>> {
    Json(Envelope::message_only("ok"))
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Envelope<()>>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(Envelope::message_only("ready"))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Envelope::failure(
                    "store unavailable",
                    ErrorDetail {
                        code: "store_unavailable",
                        details: None,
                    },
                )),
            )
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<Envelope<serde_json::Value>> {
    Json(Envelope::ok(
        "version",
        serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.environment.as_str()
        }),
    ))
}

/// GET /, GET /health, GET /ready, GET /version.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
}
