use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use baitech_core::models::{ImageVariant, SizeTag, UploadResult};
use baitech_core::StorageBackend;
use baitech_processing::{ImageOptimizer, ImageValidator, OptimizedImage};
use baitech_storage::keys::{all_keys_for_stem, primary_key, variant_key};
use baitech_storage::Storage;
use futures::future::join_all;

use super::{ImageStorageProvider, ImageUpload, ProviderError};

/// Optimizes uploads into size variants and writes them to local storage.
///
/// Layout per stem: `images/{stem}.{ext}` for the primary (medium) variants
/// and `images_optimized/{size}/{stem}.{ext}` for every size.
pub struct LocalOptimizedProvider {
    storage: Arc<dyn Storage>,
    optimizer: ImageOptimizer,
    validator: ImageValidator,
}

impl LocalOptimizedProvider {
    pub fn new(storage: Arc<dyn Storage>, optimizer: ImageOptimizer, validator: ImageValidator) -> Self {
        Self {
            storage,
            optimizer,
            validator,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    /// Write every variant; returns (primary locations, all variants).
    async fn write_variants(
        &self,
        stem: &str,
        optimized: &OptimizedImage,
    ) -> Result<(Vec<String>, Vec<ImageVariant>), ProviderError> {
        let mut writes = Vec::new();
        for variant in &optimized.variants {
            let ext = variant.format.extension();
            let mime = variant.format.mime_type();
            writes.push((variant_key(variant.size, stem, ext), variant.data.clone(), mime));
            if variant.size == SizeTag::PRIMARY {
                writes.push((primary_key(stem, ext), variant.data.clone(), mime));
            }
        }

        // Let every write settle so each one removes its own partial file.
        let results = join_all(
            writes
                .into_iter()
                .map(|(key, data, mime)| async move {
                    self.storage.upload_with_key(&key, data, mime).await
                }),
        )
        .await;
        if let Some(e) = results.into_iter().find_map(Result::err) {
            return Err(e.into());
        }

        let locations = optimized
            .primary()
            .map(|v| self.storage.public_url(&primary_key(stem, v.format.extension())))
            .collect();

        let variants = optimized
            .variants
            .iter()
            .map(|v| ImageVariant {
                size: v.size,
                format: v.format,
                location: self
                    .storage
                    .public_url(&variant_key(v.size, stem, v.format.extension())),
            })
            .collect();

        Ok((locations, variants))
    }
}

#[async_trait]
impl ImageStorageProvider for LocalOptimizedProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn backend(&self) -> StorageBackend {
        self.storage.backend_type()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn accepts(&self, filename: &str) -> bool {
        self.validator.validate_extension(filename).is_ok()
    }

    async fn attempt_upload(&self, upload: &ImageUpload) -> Result<UploadResult, ProviderError> {
        let start = Instant::now();

        let optimized = self.optimizer.optimize_blocking(upload.data.clone()).await?;

        let (locations, variants) = match self.write_variants(&upload.stem, &optimized).await {
            Ok(written) => written,
            Err(e) => {
                // Do not leave a half-written variant set behind.
                if let Err(cleanup) = self.attempt_delete(&upload.stem, &upload.folder).await {
                    tracing::warn!(stem = %upload.stem, error = %cleanup, "Cleanup after failed write failed");
                }
                return Err(e);
            }
        };

        tracing::info!(
            provider = self.name(),
            stem = %upload.stem,
            source_width = optimized.source_width,
            source_height = optimized.source_height,
            variant_count = variants.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image optimized and stored locally"
        );

        Ok(UploadResult::local(
            format!("Successfully optimized {}", upload.filename),
            locations,
            variants,
        ))
    }

    async fn attempt_delete(&self, stem: &str, _folder: &str) -> Result<(), ProviderError> {
        let keys = all_keys_for_stem(stem);
        let results = join_all(keys.iter().map(|key| self.storage.delete(key))).await;

        let mut first_error = None;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(key = %key, error = %e, "Failed to delete image variant");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
