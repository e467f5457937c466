use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Suffix counter for in-progress writes, unique within the process.
static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Filesystem store rooted at the site's public media directory.
///
/// Writes land in a sibling `.partial` file first and are renamed into place,
/// so a web server reading the media root never serves a truncated variant.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Open (creating if needed) a store under `base_path`.
    ///
    /// `base_url` prefixes public URLs; an empty prefix yields site-relative
    /// paths such as `/images/widget.jpg`.
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot create media root {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve `storage_key` under the media root.
    ///
    /// Keys are relative, slash-separated and made of plain components only.
    fn resolve(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let key = Path::new(storage_key);
        let plain = !storage_key.is_empty()
            && !storage_key.contains('\\')
            && key.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }

        let path = self.base_path.join(key);

        // An existing entry may be a symlink pointing out of the media root.
        if let Ok(real) = path.canonicalize() {
            let root = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Cannot resolve media root: {}", e))
            })?;
            if !real.starts_with(&root) {
                return Err(StorageError::InvalidKey(format!(
                    "{} resolves outside the media root",
                    storage_key
                )));
            }
        }

        Ok(path)
    }

    fn partial_path(path: &Path) -> PathBuf {
        let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{}.partial", std::process::id(), seq));
        path.with_file_name(name)
    }

    async fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = Self::partial_path(path);
        let written = async {
            let mut file = fs::File::create(&partial).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&partial, path).await
        }
        .await;

        if written.is_err() {
            let _ = fs::remove_file(&partial).await;
        }
        written
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let path = self.resolve(storage_key)?;
        let start = Instant::now();

        Self::write_atomically(&path, &data).await.map_err(|e| {
            StorageError::UploadFailed(format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!(
            key = %storage_key,
            content_type = %content_type,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored image file"
        );

        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.resolve(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %storage_key, "Removed image file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.resolve(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
