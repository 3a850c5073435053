//! Standard response envelope helpers.

use crate::error::ErrorDetail;
use axum::{http::StatusCode, Json};
use serde::Serialize;

/// `{ success, message, data, error? }`. `data` is null whenever `success` is false.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: ErrorDetail) -> Self {
        Envelope {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error),
        }
    }
}

impl Envelope<()> {
    /// Success without a payload (liveness, readiness).
    pub fn message_only(message: impl Into<String>) -> Self {
        Envelope {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::ok(message, data)))
}

pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::ok(message, data)))
}
