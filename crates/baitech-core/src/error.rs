//! Error types module
//!
//! This module provides the core error types used throughout the backend.
//! Expected upload failures (bad file type, undecodable image) are reported as
//! failed `UploadResult`s by the services layer; everything that reaches
//! `AppError` is a failure the boundary layer must map to a response code.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Level an error should be logged at by the boundary that reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes such as a rejected upload
    Debug,
    /// Degraded but recoverable, e.g. a failing CDN
    Warn,
    Error,
}

/// How a boundary (CLI, HTTP handler) should present an error.
pub trait ErrorMetadata {
    /// Status code an HTTP boundary would answer with.
    fn http_status_code(&self) -> u16;

    /// Stable machine-readable code, e.g. `STORAGE_UNAVAILABLE`.
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed.
    fn is_recoverable(&self) -> bool;

    /// Message safe to show to the caller.
    fn client_message(&self) -> String;

    /// Whether the full message may leak internals (paths, credentials).
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Remote CDN error: {0}")]
    RemoteCdn(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::StorageUnavailable(_) => {
            (503, "STORAGE_UNAVAILABLE", true, true, LogLevel::Error)
        }
        AppError::RemoteCdn(_) => (502, "REMOTE_CDN_ERROR", true, true, LogLevel::Warn),
        AppError::ImageProcessing(_) => {
            (400, "IMAGE_PROCESSING_ERROR", false, false, LogLevel::Warn)
        }
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::Configuration(_) => (500, "CONFIGURATION_ERROR", false, true, LogLevel::Error),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// The message followed by up to five `source()` causes, one per line.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut lines = vec![self.to_string()];
        let mut current = self.source();
        let mut depth = 0;
        while let Some(cause) = current {
            if depth == 5 {
                lines.push("  ... (truncated)".to_string());
                break;
            }
            lines.push(format!("  Caused by: {}", cause));
            current = cause.source();
            depth += 1;
        }
        lines.join("\n")
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::StorageUnavailable(_) => {
                "Image storage is temporarily unavailable".to_string()
            }
            AppError::RemoteCdn(_) => "Image CDN request failed".to_string(),
            AppError::ImageProcessing(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Configuration(_) => "Server misconfiguration".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
