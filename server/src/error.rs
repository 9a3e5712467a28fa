//! API error types for HTTP clients
//!
//! Provides structured, type-safe errors that serialize to `{"code": "...", "message": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Errors returned by HTTP handlers
///
/// Each variant serializes with a snake_case `code` field for client matching.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ApiError {
    // Validation errors
    MissingUid { message: String },
    MissingFile { message: String },
    UnsupportedFile { message: String },
    InvalidUpload { message: String },

    // Not found errors
    UploadNotFound { message: String },

    // Operation errors
    StorageError { message: String },
    InternalError { message: String },
}

impl ApiError {
    pub fn missing_uid() -> Self {
        Self::MissingUid {
            message: "No UID provided".to_string(),
        }
    }

    pub fn missing_file() -> Self {
        Self::MissingFile {
            message: "No file provided in the 'file' field".to_string(),
        }
    }

    pub fn unsupported_file() -> Self {
        Self::UnsupportedFile {
            message: "This file is not supported. Only PPTX and PDF files are supported."
                .to_string(),
        }
    }

    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self::InvalidUpload {
            message: message.into(),
        }
    }

    pub fn upload_not_found() -> Self {
        Self::UploadNotFound {
            message: "File not found".to_string(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::MissingUid { message }
            | Self::MissingFile { message }
            | Self::UnsupportedFile { message }
            | Self::InvalidUpload { message }
            | Self::UploadNotFound { message }
            | Self::StorageError { message }
            | Self::InternalError { message } => message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUid { .. }
            | Self::MissingFile { .. }
            | Self::UnsupportedFile { .. }
            | Self::InvalidUpload { .. } => StatusCode::BAD_REQUEST,
            Self::UploadNotFound { .. } => StatusCode::NOT_FOUND,
            Self::StorageError { .. } | Self::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(self)).into_response()
    }
}

// Conversion from anyhow::Error (used by explainer-core glue)
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{err:#}"))
    }
}

impl From<explainer_core::StoreError> for ApiError {
    fn from(err: explainer_core::StoreError) -> Self {
        Self::storage(err.to_string())
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
