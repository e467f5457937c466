//! Test helpers: build upload services over a temporary media root.
//!
//! Run from workspace root: `cargo test -p baitech-services --test images_test`.
//! Nothing here needs Docker or network access; the CDN is a mockito server.

#![allow(dead_code)]

pub mod fixtures;

use baitech_core::config::CloudinaryConfig;
use baitech_services::{
    CloudinaryClient, CodecSupport, ImageOptimizer, ImageUploadService, LocalStorage,
    RemoteImageCdn,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const FOLDER: &str = "baitech/products";

/// Upload service plus the media root it writes to.
pub struct TestApp {
    pub service: ImageUploadService,
    pub media_root: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn path(&self, key: &str) -> PathBuf {
        self.media_root.join(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    /// Every file currently stored under the media root, as relative keys.
    pub fn stored_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_files(&self.media_root, &self.media_root, &mut keys);
        keys.sort();
        keys
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}

/// Cloudinary configuration pointed at a mock server.
pub fn cloudinary_config(server_url: &str) -> CloudinaryConfig {
    CloudinaryConfig {
        cloud_name: Some("demo".to_string()),
        api_key: Some("123456".to_string()),
        api_secret: Some("secret".to_string()),
        folder: FOLDER.to_string(),
        api_base_url: server_url.to_string(),
        delivery_base_url: "https://res.cloudinary.com".to_string(),
        timeout: Duration::from_secs(5),
        eager_transformations: true,
    }
}

/// Service without a CDN, encoding JPEG and WebP only.
pub async fn setup_local_app() -> TestApp {
    setup_app(CodecSupport::baseline(), None).await
}

/// Service whose CDN is the mock server at `server_url`.
pub async fn setup_cdn_app(server_url: &str) -> TestApp {
    let client = CloudinaryClient::new(cloudinary_config(server_url))
        .expect("Failed to build Cloudinary client");
    setup_app(CodecSupport::baseline(), Some(Arc::new(client))).await
}

pub async fn setup_app(codecs: CodecSupport, cdn: Option<Arc<dyn RemoteImageCdn>>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let media_root = temp_dir.path().join("public");
    let storage = LocalStorage::new(&media_root, String::new())
        .await
        .expect("Failed to create local storage");

    let service = ImageUploadService::new(
        Arc::new(storage),
        ImageOptimizer::new(codecs),
        cdn,
        MAX_FILE_SIZE,
        FOLDER,
    );

    TestApp {
        service,
        media_root,
        _temp_dir: temp_dir,
    }
}
