// ABOUTME: Unified error handling for the Snapdish ingestion service
// ABOUTME: Defines error codes, HTTP status mapping, and the JSON error wire shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Unified Error Handling
//!
//! Central error type for all components of the ingestion pipeline. Each
//! component failure carries an [`ErrorCode`] that determines the HTTP status
//! the request handler responds with, keeping the taxonomy in one place:
//! validation failures are the client's fault (400-class), component failures
//! (upload, extraction, persistence) are server-side (500-class).

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied = 1004,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    #[serde(rename = "IMAGE_REJECTED")]
    ImageRejected = 3010,

    // Resources (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,

    // Pipeline components (5000-5999)
    #[serde(rename = "UPLOAD_FAILED")]
    UploadFailed = 5000,
    #[serde(rename = "EXTRACTION_FAILED")]
    ExtractionFailed = 5001,
    #[serde(rename = "PERSISTENCE_FAILED")]
    PersistenceFailed = 5002,
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request: missing image / missing credential / bad payload
            Self::InvalidInput | Self::MissingRequiredField => 400,

            // 401 Unauthorized: a credential was supplied but did not validate
            Self::AuthInvalid => 401,

            // 403 Forbidden
            Self::PermissionDenied => 403,

            // 404 Not Found
            Self::ResourceNotFound => 404,

            // 422 Unprocessable: image pre-check rejected the content
            Self::ImageRejected => 422,

            // 503 Service Unavailable
            Self::ExternalRateLimited => 503,

            // 500 Internal Server Error: component failures are not the
            // client's fault and are surfaced generically
            Self::UploadFailed
            | Self::ExtractionFailed
            | Self::PersistenceFailed
            | Self::ConfigError
            | Self::InternalError
            | Self::DatabaseError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthInvalid => "The provided access token is invalid",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ImageRejected => "The supplied image was rejected by the content pre-check",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::UploadFailed => "Failed to upload image",
            Self::ExtractionFailed => "Failed to generate recipe",
            Self::PersistenceFailed => "Failed to save recipe",
            Self::ExternalRateLimited => "External service rate limit exceeded",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Missing required request field (client's fault, not retried)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message)
    }

    /// Invalid input value
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Invalid authentication credential
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Caller is not allowed to touch this resource
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Image pre-check rejected the content (not food / not a recipe)
    pub fn image_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ImageRejected, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Blob store write failed
    pub fn upload(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UploadFailed, message)
    }

    /// Model call failed or returned a schema-nonconforming result
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExtractionFailed, message)
    }

    /// Database write failed
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceFailed, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::new(ErrorCode::DatabaseError, error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format: `{ "error": <string>, "details"?: <string> }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short human-readable error message
    pub error: String,
    /// Underlying cause, when one is safe to surface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        let details = if error.message == error.code.description() {
            None
        } else {
            Some(error.message.clone())
        };
        Self {
            error: error.code.description().to_owned(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = axum::http::StatusCode::from_u16(self.http_status())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = ?self.code, error = %self, "request failed");
        } else {
            tracing::debug!(code = ?self.code, error = %self, "request rejected");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::MissingRequiredField.http_status(), 400);
        assert_eq!(ErrorCode::AuthInvalid.http_status(), 401);
        assert_eq!(ErrorCode::ImageRejected.http_status(), 422);
        assert_eq!(ErrorCode::UploadFailed.http_status(), 500);
        assert_eq!(ErrorCode::ExtractionFailed.http_status(), 500);
        assert_eq!(ErrorCode::PersistenceFailed.http_status(), 500);
    }

    #[test]
    fn test_error_response_wire_shape() {
        let error = AppError::extraction("model returned a malformed object");
        let response = ErrorResponse::from(&error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Failed to generate recipe\""));
        assert!(json.contains("\"details\":\"model returned a malformed object\""));
    }

    #[test]
    fn test_error_response_omits_redundant_details() {
        let error = AppError::new(
            ErrorCode::UploadFailed,
            ErrorCode::UploadFailed.description(),
        );
        let response = ErrorResponse::from(&error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_source_chaining() {
        let io = std::io::Error::other("boom");
        let error = AppError::upload("write failed").with_source(io);
        assert!(std::error::Error::source(&error).is_some());
    }
}
