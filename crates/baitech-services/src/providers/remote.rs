use std::sync::Arc;

use async_trait::async_trait;
use baitech_core::models::UploadResult;
use baitech_core::StorageBackend;
use baitech_processing::ImageValidator;

use super::{ImageStorageProvider, ImageUpload, ProviderError};
use crate::cloudinary::{CdnError, RemoteImageCdn};

/// Uploads the file as received to the remote CDN, which derives the variants.
pub struct CloudinaryProvider {
    cdn: Arc<dyn RemoteImageCdn>,
    validator: ImageValidator,
}

impl CloudinaryProvider {
    pub fn new(cdn: Arc<dyn RemoteImageCdn>, validator: ImageValidator) -> Self {
        Self { cdn, validator }
    }

    pub fn cdn(&self) -> &Arc<dyn RemoteImageCdn> {
        &self.cdn
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }
}

#[async_trait]
impl ImageStorageProvider for CloudinaryProvider {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Cloudinary
    }

    fn is_available(&self) -> bool {
        self.cdn.is_configured()
    }

    fn accepts(&self, filename: &str) -> bool {
        self.validator.validate_extension(filename).is_ok()
    }

    async fn attempt_upload(&self, upload: &ImageUpload) -> Result<UploadResult, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable(self.name()));
        }

        let remote = self
            .cdn
            .upload(
                upload.data.clone(),
                &upload.filename,
                &upload.stem,
                &upload.folder,
            )
            .await?;

        Ok(UploadResult::remote(
            format!("Successfully uploaded {} to Cloudinary", upload.filename),
            remote,
        ))
    }

    async fn attempt_delete(&self, stem: &str, folder: &str) -> Result<(), ProviderError> {
        if !self.is_available() {
            return Ok(());
        }

        let public_id = format!("{}/{}", folder.trim_end_matches('/'), stem);
        match self.cdn.delete(&public_id).await {
            Ok(()) => Ok(()),
            Err(CdnError::DeleteRejected { result, .. }) if result == "not found" => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
