//! Baitech Processing Library
//!
//! Upload validation and the local image optimization pipeline: decode,
//! flatten onto white, downscale into the standard bounding boxes and encode
//! every size as JPEG, WebP and (best-effort) AVIF.

pub mod compression;
pub mod error;
pub mod image;
pub mod optimizer;
pub mod validator;

pub use compression::{CodecSupport, ImageCompressor};
pub use error::ProcessingError;
pub use optimizer::{EncodedVariant, ImageOptimizer, OptimizedImage};
pub use validator::{file_stem, is_allowed_file, ImageValidator, ValidationError};
