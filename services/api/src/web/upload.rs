//! services/api/src/web/upload.rs
//!
//! Photo upload. The raw request body is the file; the response carries the
//! public URL a later tasting write stores in `imageUrl`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorBody, HttpError};
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadParams {
    /// Original file name; only `[A-Za-z0-9._-]` is kept.
    pub filename: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Keeps only `[A-Za-z0-9._-]`. Returns `None` when nothing is left.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let cleaned: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// POST /api/upload?filename=<name> - Store a photo and return its URL
#[utoipa::path(
    post,
    path = "/api/upload",
    params(UploadParams),
    request_body(content_type = "application/octet-stream", description = "The file bytes."),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing filename or empty body", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let raw_name = params
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| HttpError::BadRequest("Filename is required".to_string()))?;
    let filename = sanitize_filename(&raw_name).ok_or_else(|| {
        HttpError::BadRequest("Filename has no usable characters".to_string())
    })?;
    if body.is_empty() {
        return Err(HttpError::BadRequest("No file was sent".to_string()));
    }

    let url = state.blob.put(&filename, &body).await.map_err(|e| {
        error!("Failed to store upload '{}': {:?}", filename, e);
        HttpError::Internal
    })?;

    Ok(Json(UploadResponse { url }))
}
