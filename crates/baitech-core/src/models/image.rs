use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::{AVIF_QUALITY, JPEG_QUALITY, WEBP_QUALITY};
use crate::storage_types::StorageBackend;

/// Maximum width x height of an aspect-preserving, non-upscaling resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether an image of the given dimensions already fits inside the box.
    pub fn contains(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}

/// Size tag of a generated variant. Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTag {
    Thumbnail,
    Medium,
    Large,
}

impl SizeTag {
    pub const ALL: [SizeTag; 3] = [SizeTag::Thumbnail, SizeTag::Medium, SizeTag::Large];

    /// Size whose variants are copied to the primary location.
    pub const PRIMARY: SizeTag = SizeTag::Medium;

    pub fn as_str(self) -> &'static str {
        match self {
            SizeTag::Thumbnail => "thumbnail",
            SizeTag::Medium => "medium",
            SizeTag::Large => "large",
        }
    }

    pub fn bounding_box(self) -> BoundingBox {
        match self {
            SizeTag::Thumbnail => BoundingBox::new(150, 150),
            SizeTag::Medium => BoundingBox::new(600, 600),
            SizeTag::Large => BoundingBox::new(1200, 1200),
        }
    }
}

impl Display for SizeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Encoded format of a generated variant. Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantFormat {
    Jpeg,
    WebP,
    Avif,
}

impl VariantFormat {
    pub const ALL: [VariantFormat; 3] = [
        VariantFormat::Jpeg,
        VariantFormat::WebP,
        VariantFormat::Avif,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            VariantFormat::Jpeg => "jpg",
            VariantFormat::WebP => "webp",
            VariantFormat::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            VariantFormat::Jpeg => "image/jpeg",
            VariantFormat::WebP => "image/webp",
            VariantFormat::Avif => "image/avif",
        }
    }

    /// Encoder quality on a 0-100 scale.
    pub fn quality(self) -> f32 {
        match self {
            VariantFormat::Jpeg => JPEG_QUALITY as f32,
            VariantFormat::WebP => WEBP_QUALITY,
            VariantFormat::Avif => AVIF_QUALITY as f32,
        }
    }

    /// JPEG and WebP must succeed for an upload to count; AVIF is best-effort.
    pub fn is_required(self) -> bool {
        !matches!(self, VariantFormat::Avif)
    }
}

impl Display for VariantFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// A stored variant: where one size/format derivative of an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub size: SizeTag,
    pub format: VariantFormat,
    pub location: String,
}

/// Delivery URL of one named CDN transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedUrl {
    pub size: SizeTag,
    pub url: String,
}

/// Metadata returned by the remote CDN for an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub public_id: String,
    pub secure_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    pub derived_urls: Vec<DerivedUrl>,
}

impl RemoteImage {
    pub fn derived_url(&self, size: SizeTag) -> Option<&str> {
        self.derived_urls
            .iter()
            .find(|d| d.size == size)
            .map(|d| d.url.as_str())
    }
}

/// Outcome of a single upload request.
///
/// Never persisted; callers copy `primary_path()` onto the owning product or
/// service record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    /// Primary-location references, JPEG first.
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageBackend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ImageVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteImage>,
}

impl UploadResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            locations: Vec::new(),
            storage: None,
            variants: Vec::new(),
            remote: None,
        }
    }

    pub fn local(
        message: impl Into<String>,
        locations: Vec<String>,
        variants: Vec<ImageVariant>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            locations,
            storage: Some(StorageBackend::Local),
            variants,
            remote: None,
        }
    }

    pub fn remote(message: impl Into<String>, remote: RemoteImage) -> Self {
        Self {
            success: true,
            message: message.into(),
            locations: vec![remote.secure_url.clone()],
            storage: Some(StorageBackend::Cloudinary),
            variants: Vec::new(),
            remote: Some(remote),
        }
    }

    pub fn primary_path(&self) -> Option<&str> {
        self.locations.first().map(String::as_str)
    }
}
