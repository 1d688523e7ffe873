//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and the error returned
//! by HTTP handlers.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use beer_journal_core::ports::PortError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// HTTP Errors
//=========================================================================================

/// Per-field validation messages, keyed by the camelCase field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

/// An error a handler can return. Internal detail never reaches the client.
#[derive(Debug)]
pub enum HttpError {
    Validation(FieldErrors),
    BadRequest(String),
    Unauthorized,
    NotFound(&'static str),
    Conflict(String),
    Internal,
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self {
            HttpError::Validation(_) | HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Unauthorized => StatusCode::UNAUTHORIZED,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            HttpError::Validation(details) => ErrorBody {
                error: "Invalid data".to_string(),
                details: Some(details),
            },
            HttpError::BadRequest(message) | HttpError::Conflict(message) => ErrorBody {
                error: message,
                details: None,
            },
            HttpError::Unauthorized => ErrorBody {
                error: "Unauthorized".to_string(),
                details: None,
            },
            HttpError::NotFound(what) => ErrorBody {
                error: format!("{} not found", what),
                details: None,
            },
            HttpError::Internal => ErrorBody {
                error: "Internal server error".to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(_) => HttpError::NotFound("Tasting"),
            PortError::Conflict(message) => HttpError::Conflict(message),
            PortError::Unauthorized => HttpError::Unauthorized,
            PortError::Unexpected(detail) => {
                error!("Persistence failure: {}", detail);
                HttpError::Internal
            }
        }
    }
}
