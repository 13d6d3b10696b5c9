//! Error types for the DocDesk server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::InvalidId;
use crate::render::RenderError;
use crate::store::StoreError;
use crate::view::{ActionError, ViewError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Lifecycle action refused for the record's current partition
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Store rejected a lifecycle action; the message is shown as an alert
    #[error("Store error: {0}")]
    Alert(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<InvalidId> for AppError {
    fn from(err: InvalidId) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ViewError> for AppError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Transient(e) => AppError::Unavailable(e.to_string()),
            other => AppError::NotFound(other.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::PageOutOfRange { .. } => AppError::NotFound(err.to_string()),
            RenderError::Timeout(_) => AppError::Unavailable(err.to_string()),
            RenderError::Task(msg) => AppError::Internal(msg),
            other => AppError::NotFound(other.to_string()),
        }
    }
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Disabled(_) => AppError::Forbidden(err.to_string()),
            ActionError::NotLoaded => AppError::Conflict(err.to_string()),
            ActionError::Unsupported(_) => AppError::Unsupported(err.to_string()),
            ActionError::Store(e) => AppError::Alert(alert_message(&e)),
        }
    }
}

/// User-facing text for a failed delete
fn alert_message(err: &StoreError) -> String {
    match err {
        StoreError::AccessDenied(_) => {
            "You do not have permission to delete this document.".to_string()
        }
        _ => format!("Failed to delete document: {}", err),
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Unsupported(msg) => (StatusCode::CONFLICT, "unsupported", msg.clone()),
            AppError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    msg.clone(),
                )
            }
            AppError::Alert(msg) => (StatusCode::BAD_GATEWAY, "alert", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
