//! Image upload orchestration
//!
//! Uploads go through an ordered provider chain: the remote CDN first when it
//! is configured, then the local optimization pipeline. The first provider to
//! succeed wins and lower-priority providers drop whatever they still hold for
//! the same stem, so an image never lives in two places.

use std::sync::Arc;
use std::time::Instant;

use baitech_core::models::UploadResult;
use baitech_core::{AppConfig, AppError, StorageBackend};
use baitech_processing::{file_stem, is_allowed_file, CodecSupport, ImageOptimizer, ImageValidator};
use baitech_storage::{create_storage, Storage};
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::cloudinary::{CloudinaryClient, RemoteImageCdn};
use crate::providers::{
    CloudinaryProvider, ImageStorageProvider, ImageUpload, LocalOptimizedProvider, ProviderError,
};

/// Concurrent uploads in [`ImageUploadService::upload_many`].
const BATCH_CONCURRENCY: usize = 4;

pub struct ImageUploadService {
    local: Arc<LocalOptimizedProvider>,
    remote: Option<Arc<CloudinaryProvider>>,
    /// Priority order.
    providers: Vec<Arc<dyn ImageStorageProvider>>,
    max_file_size: usize,
    default_folder: String,
}

impl ImageUploadService {
    pub fn new(
        storage: Arc<dyn Storage>,
        optimizer: ImageOptimizer,
        cdn: Option<Arc<dyn RemoteImageCdn>>,
        max_file_size: usize,
        default_folder: impl Into<String>,
    ) -> Self {
        let local = Arc::new(LocalOptimizedProvider::new(
            storage,
            optimizer,
            ImageValidator::local(max_file_size),
        ));
        let remote = cdn.map(|cdn| {
            Arc::new(CloudinaryProvider::new(
                cdn,
                ImageValidator::remote(max_file_size),
            ))
        });

        let mut providers: Vec<Arc<dyn ImageStorageProvider>> = Vec::with_capacity(2);
        if let Some(remote) = &remote {
            providers.push(remote.clone());
        }
        providers.push(local.clone());

        Self {
            local,
            remote,
            providers,
            max_file_size,
            default_folder: default_folder.into(),
        }
    }

    /// Build the service from configuration: local storage under the media
    /// root, codec capabilities of this build, and the CDN client when
    /// [`AppConfig::remote_first`] holds.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let storage = create_storage(config).await?;
        let optimizer = ImageOptimizer::new(CodecSupport::detect());

        let cdn: Option<Arc<dyn RemoteImageCdn>> = if config.remote_first() {
            Some(Arc::new(CloudinaryClient::new(config.cloudinary.clone())?))
        } else {
            tracing::info!(
                backend = %config.storage_backend,
                "Cloudinary disabled; images will be stored locally"
            );
            None
        };

        Ok(Self::new(
            storage,
            optimizer,
            cdn,
            config.max_file_size_bytes,
            config.cloudinary.folder.clone(),
        ))
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn ImageStorageProvider>> {
        self.providers.iter()
    }

    pub fn local(&self) -> &LocalOptimizedProvider {
        &self.local
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }

    /// Whether the local pipeline accepts this filename's extension.
    pub fn is_allowed_file(&self, filename: &str) -> bool {
        is_allowed_file(filename)
    }

    /// Store an upload through the provider chain.
    ///
    /// Invalid or undecodable input yields a failed [`UploadResult`]. When every
    /// attempted provider fails for another reason the error is
    /// [`AppError::StorageUnavailable`].
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_image(
        &self,
        data: Bytes,
        filename: &str,
        folder: Option<&str>,
    ) -> Result<UploadResult, AppError> {
        let start = Instant::now();

        let available: Vec<&Arc<dyn ImageStorageProvider>> =
            self.providers.iter().filter(|p| p.is_available()).collect();

        let remote_available = available
            .iter()
            .any(|p| p.backend() == StorageBackend::Cloudinary);
        let validator = if remote_available {
            ImageValidator::remote(self.max_file_size)
        } else {
            ImageValidator::local(self.max_file_size)
        };
        let stem = match validator.validate_all(filename, data.len()) {
            Ok(stem) => stem,
            Err(e) => {
                tracing::debug!(filename = %filename, error = %e, "Upload rejected");
                return Ok(UploadResult::failure(e.to_string()));
            }
        };

        let upload = ImageUpload {
            data,
            filename: filename.to_string(),
            stem,
            folder: folder.unwrap_or(&self.default_folder).to_string(),
        };

        let mut failures = Vec::new();
        for (index, provider) in available.iter().enumerate() {
            if !provider.accepts(filename) {
                tracing::debug!(provider = provider.name(), filename = %filename, "Provider does not accept file type");
                continue;
            }

            match provider.attempt_upload(&upload).await {
                Ok(result) => {
                    self.remove_stale_copies(&available[index + 1..], &upload)
                        .await;
                    tracing::info!(
                        provider = provider.name(),
                        stem = %upload.stem,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Image upload completed"
                    );
                    return Ok(result);
                }
                Err(ProviderError::Rejected(e)) => {
                    tracing::debug!(provider = provider.name(), error = %e, "Upload rejected");
                    return Ok(UploadResult::failure(e.to_string()));
                }
                Err(e) => {
                    tracing::info!(
                        provider = provider.name(),
                        error = %e,
                        "Provider upload failed; trying next provider"
                    );
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        tracing::error!(
            stem = %upload.stem,
            failures = ?failures,
            "All image providers failed"
        );
        Err(AppError::StorageUnavailable(if failures.is_empty() {
            format!("No provider accepts {}", filename)
        } else {
            failures.join("; ")
        }))
    }

    async fn remove_stale_copies(
        &self,
        lower: &[&Arc<dyn ImageStorageProvider>],
        upload: &ImageUpload,
    ) {
        for provider in lower {
            if let Err(e) = provider.attempt_delete(&upload.stem, &upload.folder).await {
                tracing::warn!(
                    provider = provider.name(),
                    stem = %upload.stem,
                    error = %e,
                    "Failed to remove stale copy"
                );
            }
        }
    }

    /// Run only the local optimization pipeline.
    pub async fn optimize_uploaded_image(
        &self,
        data: Bytes,
        filename: &str,
    ) -> Result<UploadResult, AppError> {
        let stem = match self.local.validator().validate_all(filename, data.len()) {
            Ok(stem) => stem,
            Err(e) => return Ok(UploadResult::failure(e.to_string())),
        };

        let upload = ImageUpload {
            data,
            filename: filename.to_string(),
            stem,
            folder: self.default_folder.clone(),
        };

        match self.local.attempt_upload(&upload).await {
            Ok(result) => Ok(result),
            Err(ProviderError::Rejected(e)) => Ok(UploadResult::failure(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Upload straight to the remote CDN without local fallback.
    ///
    /// Every failure, including missing credentials, comes back as a failed
    /// result; nothing is sent when the CDN is not configured.
    pub async fn upload_image_remote(
        &self,
        data: Bytes,
        filename: &str,
        folder: Option<&str>,
    ) -> UploadResult {
        let Some(remote) = self.remote.as_ref().filter(|r| r.is_available()) else {
            return UploadResult::failure(crate::cloudinary::CdnError::NotConfigured.to_string());
        };

        let stem = match remote.validator().validate_all(filename, data.len()) {
            Ok(stem) => stem,
            Err(e) => return UploadResult::failure(e.to_string()),
        };

        let upload = ImageUpload {
            data,
            filename: filename.to_string(),
            stem,
            folder: folder.unwrap_or(&self.default_folder).to_string(),
        };

        match remote.attempt_upload(&upload).await {
            Ok(result) => result,
            Err(e) => {
                tracing::info!(filename = %filename, error = %e, "Remote upload failed");
                UploadResult::failure(format!("Upload failed: {}", e))
            }
        }
    }

    /// Delete every locally stored variant of `filename`'s stem.
    ///
    /// The extension of `filename` is ignored. Deleting a stem with nothing
    /// stored succeeds.
    pub async fn delete_image_variants(&self, filename: &str) -> bool {
        let stem = match file_stem(filename) {
            Ok(stem) => stem,
            Err(e) => {
                tracing::debug!(filename = %filename, error = %e, "Refusing to delete");
                return false;
            }
        };

        match self.local.attempt_delete(&stem, &self.default_folder).await {
            Ok(()) => {
                tracing::info!(stem = %stem, "Image variants deleted");
                true
            }
            Err(e) => {
                tracing::warn!(stem = %stem, error = %e, "Failed to delete image variants");
                false
            }
        }
    }

    /// Delete an object from the remote CDN by public id.
    pub async fn delete_remote(&self, public_id: &str) -> (bool, String) {
        let Some(remote) = self.remote.as_ref().filter(|r| r.is_available()) else {
            return (
                false,
                crate::cloudinary::CdnError::NotConfigured.to_string(),
            );
        };

        match remote.cdn().delete(public_id).await {
            Ok(()) => (true, format!("Successfully deleted {}", public_id)),
            Err(e) => (false, e.to_string()),
        }
    }

    /// Upload several files; a failing file does not abort the rest.
    ///
    /// Returns the successful results in input order and one message per failure.
    pub async fn upload_many(
        &self,
        files: Vec<(String, Bytes)>,
        folder: Option<&str>,
    ) -> (Vec<UploadResult>, Vec<String>) {
        let outcomes: Vec<(String, Result<UploadResult, AppError>)> = stream::iter(files)
            .map(|(filename, data)| async move {
                let outcome = self.upload_image(data, &filename, folder).await;
                (filename, outcome)
            })
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (filename, outcome) in outcomes {
            match outcome {
                Ok(result) if result.success => results.push(result),
                Ok(result) => errors.push(format!("{}: {}", filename, result.message)),
                Err(e) => errors.push(format!("{}: {}", filename, e)),
            }
        }

        tracing::info!(
            uploaded = results.len(),
            failed = errors.len(),
            "Batch upload finished"
        );
        (results, errors)
    }
}
