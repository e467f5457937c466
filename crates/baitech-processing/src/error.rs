use baitech_core::models::VariantFormat;
use baitech_core::AppError;

use crate::validator::ValidationError;

/// Errors raised while turning an upload into variants
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {format} variant: {message}")]
    Encode {
        format: VariantFormat,
        message: String,
    },

    #[error("{0} encoding is not available in this build")]
    UnsupportedFormat(VariantFormat),

    #[error("Image processing task failed: {0}")]
    Task(String),
}

impl ProcessingError {
    pub fn encode(format: VariantFormat, err: impl std::fmt::Display) -> Self {
        ProcessingError::Encode {
            format,
            message: err.to_string(),
        }
    }

    /// Failures caused by the uploaded payload rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProcessingError::Validation(_) | ProcessingError::Decode(_)
        )
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Validation(e) => AppError::InvalidInput(e.to_string()),
            ProcessingError::Decode(msg) => AppError::ImageProcessing(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
