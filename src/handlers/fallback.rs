//! Envelopes for requests that never reach a resource handler: unknown routes, unbound
//! methods and panics.

use crate::error::{AppError, ErrorDetail};
use crate::response::Envelope;
use crate::shutdown::panic_message;
use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("route {}", uri.path()))
}

/// Known path, method not bound on it.
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{} {}", method, uri.path()))
}

/// Used by `CatchPanicLayer`: one request's panic becomes a 500 envelope, not a dropped connection.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = %panic_message(err.as_ref()), "handler panicked");
    let body: Envelope<()> = Envelope::failure(
        "internal server error",
        ErrorDetail {
            code: "internal_error",
            details: None,
        },
    );
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
