//! Typed errors and HTTP mapping.

use crate::response::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {reason}")]
    InvalidEnvVar { name: String, reason: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("duplicate collection: {0}")]
    DuplicateCollection(String),
    #[error("invalid schema for {resource}: {reason}")]
    InvalidSchema { resource: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("malformed document {id} in {collection}: {reason}")]
    Malformed {
        collection: String,
        id: String,
        reason: String,
    },
    #[error("store is closed")]
    Closed,
}

/// Anything that stops the process before it starts serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
}

/// One field-level schema violation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub constraint: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, constraint: &'static str, message: impl Into<String>) -> Self {
        FieldViolation {
            field: field.to_string(),
            constraint,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldViolation>),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// HTTP status for this error. Pure so the mapping can be tested without a server.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidIdentifier(_) => "invalid_identifier",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::MethodNotAllowed(_) => "method_not_allowed",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Store(_) => "store_error",
        }
    }

    /// Client-facing message. Store internals stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            AppError::Validation(violations) => serde_json::to_value(violations).ok(),
            _ => None,
        };
        let body: Envelope<()> = Envelope::failure(
            self.public_message(),
            ErrorDetail {
                code: self.code(),
                details,
            },
        );
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_error_kind() {
        let cases = [
            (AppError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (AppError::InvalidIdentifier("x".into()), StatusCode::BAD_REQUEST),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Store(StoreError::Closed), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::MethodNotAllowed("PUT".into()), StatusCode::METHOD_NOT_ALLOWED),
            (AppError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn store_errors_do_not_leak_details() {
        let err = AppError::Store(StoreError::UnknownCollection("secret_table".into()));
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn validation_message_lists_every_violation() {
        let err = AppError::Validation(vec![
            FieldViolation::new("name", "required", "name is required"),
            FieldViolation::new("price", "minimum", "price must be at least 0"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: name is required; price must be at least 0"
        );
    }
}
