//! Unified error handling for Payconf Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {message}")]
    NotFound { message: String, id: Option<String> },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {message}")]
    Conflict { message: String, id: Option<String> },

    #[error("Validation error: {message}")]
    Validation { message: String, id: Option<String> },

    #[error("Max allowed exceeded for {subject}: {actual} > {allowed}")]
    MaxAllowedExceeded {
        subject: String,
        allowed: usize,
        actual: usize,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Not-found error without an offending key
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
            id: None,
        }
    }

    /// Not-found error carrying the offending key in `meta.id`
    pub fn not_found_id(message: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
            id: Some(id.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            id: None,
        }
    }

    pub fn conflict_id(message: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            id: Some(id.into()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            id: None,
        }
    }

    pub fn validation_id(message: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            id: Some(id.into()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<ErrorMeta>,
}

/// Machine-readable metadata identifying the offending key
#[derive(Serialize)]
struct ErrorMeta {
    id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message, meta_id) = match &self {
            AppError::NotFound { message, id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                message.clone(),
                id.clone(),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None)
            }
            AppError::Conflict { message, id } => (
                StatusCode::CONFLICT,
                "conflict",
                message.clone(),
                id.clone(),
            ),
            AppError::Validation { message, id } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation",
                message.clone(),
                id.clone(),
            ),
            AppError::MaxAllowedExceeded { subject, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "max_allowed_exceeded",
                self.to_string(),
                Some(subject.clone()),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "cache_error",
                    "A cache error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            meta: meta_id.map(|id| ErrorMeta { id }),
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::validation(errors.to_string())
    }
}
