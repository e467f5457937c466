//! Image storage providers
//!
//! A provider stores one upload somewhere and can remove what it stored for a
//! stem. The upload service tries providers in priority order until one
//! succeeds.

mod local;
mod remote;

pub use local::LocalOptimizedProvider;
pub use remote::CloudinaryProvider;

use async_trait::async_trait;
use baitech_core::models::UploadResult;
use baitech_core::{AppError, StorageBackend};
use baitech_processing::{ProcessingError, ValidationError};
use baitech_storage::StorageError;
use bytes::Bytes;

use crate::cloudinary::CdnError;

/// One validated upload, shared by every provider attempt.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub filename: String,
    /// Logical identity: the filename without directories or extension.
    pub stem: String,
    pub folder: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} provider is not available")]
    Unavailable(&'static str),

    /// The payload itself is unusable; another provider would fail the same way.
    #[error(transparent)]
    Rejected(ProcessingError),

    #[error(transparent)]
    Processing(ProcessingError),

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    Cdn(#[from] CdnError),
}

impl From<ProcessingError> for ProviderError {
    fn from(err: ProcessingError) -> Self {
        if err.is_client_error() {
            ProviderError::Rejected(err)
        } else {
            ProviderError::Processing(err)
        }
    }
}

impl From<StorageError> for ProviderError {
    fn from(err: StorageError) -> Self {
        match err {
            // Keys are derived from the client's filename.
            StorageError::InvalidKey(key) => {
                ProviderError::Rejected(ValidationError::InvalidFilename(key).into())
            }
            other => ProviderError::Storage(other),
        }
    }
}

#[async_trait]
pub trait ImageStorageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn backend(&self) -> StorageBackend;

    /// Whether the provider can be attempted at all (credentials present etc).
    fn is_available(&self) -> bool;

    /// Whether the provider handles files with this name's extension.
    fn accepts(&self, filename: &str) -> bool;

    async fn attempt_upload(&self, upload: &ImageUpload) -> Result<UploadResult, ProviderError>;

    /// Remove everything this provider stored for `stem`. Missing artifacts are not an error.
    async fn attempt_delete(&self, stem: &str, folder: &str) -> Result<(), ProviderError>;
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(provider) => {
                AppError::StorageUnavailable(format!("{} provider is not available", provider))
            }
            ProviderError::Rejected(e) | ProviderError::Processing(e) => e.into(),
            ProviderError::Storage(e) => e.into(),
            ProviderError::Cdn(e) => e.into(),
        }
    }
}
