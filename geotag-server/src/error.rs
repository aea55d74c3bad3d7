//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geotag_core::GeotagError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Geotag core error - discovery or thumbnail retrieval failed
    #[error("Geotag error: {0}")]
    Geotag(#[from] GeotagError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Geotag(ref e) => match e {
                // Remote service failures → 502
                GeotagError::DriveError(_) | GeotagError::HttpError(_) => StatusCode::BAD_GATEWAY,

                // No usable credential → 503
                GeotagError::CredentialError(_) => StatusCode::SERVICE_UNAVAILABLE,

                // Local processing failures → 500
                GeotagError::ImageError(_)
                | GeotagError::PageLimitExceeded { .. }
                | GeotagError::ConfigError(_)
                | GeotagError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Geotag(ref e) => match e {
                GeotagError::DriveError(_) => "DRIVE_ERROR",
                GeotagError::HttpError(_) => "UPSTREAM_ERROR",
                GeotagError::CredentialError(_) => "CREDENTIALS_UNAVAILABLE",
                GeotagError::ImageError(_) => "IMAGE_PROCESSING_ERROR",
                GeotagError::PageLimitExceeded { .. } => "PAGE_LIMIT_EXCEEDED",
                GeotagError::ConfigError(_) => "CONFIGURATION_ERROR",
                GeotagError::IoError(_) => "IO_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Upstream bodies and local paths stay in the logs
            Self::Geotag(ref e) => match e {
                GeotagError::DriveError(_) => "Drive request failed".to_string(),
                GeotagError::HttpError(_) => "Upstream service error".to_string(),
                GeotagError::CredentialError(_) => "Drive credentials unavailable".to_string(),
                GeotagError::ImageError(_) => "Thumbnail processing failed".to_string(),
                GeotagError::PageLimitExceeded { pages } => {
                    format!("Folder listing exceeded {} pages", pages)
                }
                GeotagError::ConfigError(_) => "Server misconfigured".to_string(),
                GeotagError::IoError(_) => "Internal I/O error".to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Geotag(_) => "geotag",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        match &self {
            Self::BadRequest(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Client error"
                );
            }
            Self::Geotag(GeotagError::CredentialError(_)) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Credentials unavailable"
                );
            }
            Self::Geotag(_) => {
                tracing::error!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    client_message = %client_message,
                    "Geotag error (internal details logged)"
                );
            }
        }

        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
