use crate::{LocalStorage, Storage, StorageResult};
use baitech_core::AppConfig;
use std::sync::Arc;

/// Create the storage backing the local image pipeline.
///
/// The remote CDN is not a `Storage`; it is wired separately as an image
/// provider, so every `STORAGE_BACKEND` value still gets a filesystem store
/// for the fallback path.
pub async fn create_storage(config: &AppConfig) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(&config.media_root, config.media_base_url.clone()).await?;

    tracing::info!(
        media_root = %config.media_root,
        backend = %storage.backend_type(),
        primary_backend = %config.storage_backend,
        "Local image storage initialized"
    );

    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_create_storage_uses_media_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        let vars: HashMap<&str, String> =
            HashMap::from([("MEDIA_ROOT", root.display().to_string())]);
        let config = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        let storage = create_storage(&config).await.unwrap();
        let url = storage
            .upload_with_key("images/x.jpg", b"x".to_vec(), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "/images/x.jpg");
        assert_eq!(storage.backend_type(), crate::StorageBackend::Local);
        assert!(root.join("images/x.jpg").is_file());
    }
}
