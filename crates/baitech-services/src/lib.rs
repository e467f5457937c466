//! Baitech Services Layer
//!
//! Business services on top of the storage, processing and database crates:
//! sequential identifier generation and the image upload pipeline with its
//! remote CDN and local fallback. Boundary layers (the CLI, an HTTP API)
//! should depend on this crate alone.

pub mod cloudinary;
pub mod identifiers;
pub mod providers;
pub mod upload;

pub use baitech_processing::{
    is_allowed_file, CodecSupport, ImageOptimizer, ImageValidator, ValidationError,
};
pub use baitech_storage::{create_storage, LocalStorage, Storage, StorageBackend, StorageError};
pub use cloudinary::{
    extract_public_id, CdnError, CloudinaryClient, RemoteImageCdn, TransformationPreset,
};
pub use identifiers::{Clock, FixedClock, IdentifierGenerator, SystemClock};
pub use providers::{
    CloudinaryProvider, ImageStorageProvider, ImageUpload, LocalOptimizedProvider, ProviderError,
};
pub use upload::ImageUploadService;
