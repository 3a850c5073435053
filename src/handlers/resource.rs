//! Resource CRUD handlers: create, list, read, update, delete.
//!
//! Each handler makes exactly one repository call and answers with one envelope.
//! Errors surface as `AppError`, whose `IntoResponse` picks the status.

use crate::error::AppError;
use crate::resources::ResourceDef;
use crate::response;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::{Map, Value};
use std::sync::Arc;

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(rejection_error)?;
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
        _ => AppError::BadRequest(rejection.body_text()),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResourceDef>>,
) -> Result<impl IntoResponse, AppError> {
    let docs = state.repository(&resource).list().await?;
    tracing::debug!(resource = resource.name, count = docs.len(), "listed");
    Ok(response::ok(format!("{} fetched successfully", resource.plural), docs))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResourceDef>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = body_to_map(body)?;
    let doc = state.repository(&resource).create(input).await?;
    Ok(response::created(format!("{} created successfully", resource.name), doc))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResourceDef>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = state.repository(&resource).get_by_id(&id).await?;
    Ok(response::ok(format!("{} fetched successfully", resource.name), doc))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResourceDef>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let patch = body_to_map(body)?;
    let doc = state.repository(&resource).update_by_id(&id, patch).await?;
    Ok(response::ok(format!("{} updated successfully", resource.name), doc))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResourceDef>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = state.repository(&resource).delete_by_id(&id).await?;
    Ok(response::ok(format!("{} deleted successfully", resource.name), doc))
}
