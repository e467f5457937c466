//! Shared key generation for stored image variants.
//!
//! Primary variants live under `images/`, size variants under
//! `images_optimized/{size}/`. Every writer and deleter goes through these
//! helpers so the layout cannot drift.

use baitech_core::constants::{
    KNOWN_VARIANT_EXTENSIONS, OPTIMIZED_IMAGES_PREFIX, PRIMARY_IMAGES_PREFIX,
};
use baitech_core::models::SizeTag;

/// Key of a primary (medium-sized) variant: `images/{stem}.{ext}`.
pub fn primary_key(stem: &str, extension: &str) -> String {
    format!("{}/{}.{}", PRIMARY_IMAGES_PREFIX, stem, extension)
}

/// Key of a size variant: `images_optimized/{size}/{stem}.{ext}`.
pub fn variant_key(size: SizeTag, stem: &str, extension: &str) -> String {
    format!("{}/{}/{}.{}", OPTIMIZED_IMAGES_PREFIX, size, stem, extension)
}

/// Every key an upload of `stem` may have produced, for any known extension.
pub fn all_keys_for_stem(stem: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(KNOWN_VARIANT_EXTENSIONS.len() * (SizeTag::ALL.len() + 1));
    for ext in KNOWN_VARIANT_EXTENSIONS {
        keys.push(primary_key(stem, ext));
        for size in SizeTag::ALL {
            keys.push(variant_key(size, stem, ext));
        }
    }
    keys
}
