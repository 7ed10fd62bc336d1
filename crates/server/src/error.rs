//! Unified error handling with Sentry integration.
//!
//! Every API handler returns `Result<T, ApiError>`. Errors are turned into a
//! JSON `{"error": "..."}` body at the boundary; server-class errors are
//! captured to Sentry first and their details never reach the client.

use axum::{
    Json,
    extract::rejection::{BytesRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::blob::BlobError;
use crate::db::RepositoryError;
use crate::services::HandoffError;

/// Message returned for every server-class error.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message returned when an upload exceeds `UPLOAD_MAX_BYTES`.
pub const BODY_TOO_LARGE_MESSAGE: &str = "Receipt body too large";

/// Application-level error type for the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Request body over the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// A required setting is absent.
    #[error("{0}")]
    Misconfigured(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Blob holder operation failed.
    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Misconfigured(_) | Self::Database(_) | Self::Blob(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Blob(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if let Self::Misconfigured(message) = &self {
            tracing::error!(message = %message, "Request refused by configuration");
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Blob(_) => INTERNAL_ERROR_MESSAGE,
            Self::Unauthorized(m)
            | Self::BadRequest(m)
            | Self::NotFound(m)
            | Self::PayloadTooLarge(m)
            | Self::Misconfigured(m) => m.as_str(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<HandoffError> for ApiError {
    fn from(err: HandoffError) -> Self {
        let message = err.to_string();
        match err {
            HandoffError::Unauthorized => Self::Unauthorized(message),
            HandoffError::MissingTerminalId | HandoffError::EmptyBody => Self::BadRequest(message),
            HandoffError::UnknownTerminal => Self::NotFound(message),
            HandoffError::Misconfigured => Self::Misconfigured(message),
            HandoffError::Repository(e) => Self::Database(e),
            HandoffError::Blob(e) => Self::Blob(e),
        }
    }
}

// Extractor rejections answer in the same `{"error"}` shape as everything else

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(BODY_TOO_LARGE_MESSAGE.to_string())
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;
