//! Fixed values shared by the image pipeline and the identifier generator.

/// Extensions accepted by the local optimization pipeline.
pub const LOCAL_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif"];

/// Extensions accepted when uploading to the remote CDN (adds animated GIF).
pub const REMOTE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "gif"];

/// Every extension a stored variant may carry; used when deleting by stem.
pub const KNOWN_VARIANT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif"];

/// Directory (key prefix) holding the primary, medium-sized variants.
pub const PRIMARY_IMAGES_PREFIX: &str = "images";

/// Directory (key prefix) holding every size variant, one subdirectory per size tag.
pub const OPTIMIZED_IMAGES_PREFIX: &str = "images_optimized";

pub const JPEG_QUALITY: u8 = 85;
pub const WEBP_QUALITY: f32 = 80.0;
pub const AVIF_QUALITY: u8 = 75;

/// Date suffix format embedded in day-scoped identifiers (e.g. `16-10-26`).
pub const IDENTIFIER_DATE_FORMAT: &str = "%d-%m-%y";

pub const DEFAULT_CLOUDINARY_FOLDER: &str = "baitech/products";
