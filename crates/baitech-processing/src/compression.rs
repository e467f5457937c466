//! Variant encoders
//!
//! JPEG goes through the `image` crate's encoder, WebP through libwebp and
//! AVIF through `ravif` when the `avif` feature is compiled in.

use crate::error::ProcessingError;
use baitech_core::models::VariantFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

/// Which variant formats this build can produce.
///
/// Resolved once when the optimizer is constructed instead of probing the
/// codec on every upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSupport {
    pub avif: bool,
}

impl CodecSupport {
    /// Capabilities of the current build.
    pub fn detect() -> Self {
        let support = Self {
            avif: cfg!(feature = "avif"),
        };
        if !support.avif {
            tracing::info!("AVIF encoder not compiled in; AVIF variants will be skipped");
        }
        support
    }

    /// Only the formats every build supports.
    pub fn baseline() -> Self {
        Self { avif: false }
    }

    pub fn supports(&self, format: VariantFormat) -> bool {
        match format {
            VariantFormat::Jpeg | VariantFormat::WebP => true,
            VariantFormat::Avif => self.avif,
        }
    }

    /// Supported formats in output order.
    pub fn formats(&self) -> Vec<VariantFormat> {
        VariantFormat::ALL
            .into_iter()
            .filter(|f| self.supports(*f))
            .collect()
    }
}

impl Default for CodecSupport {
    fn default() -> Self {
        Self::detect()
    }
}

/// Stateless encoder for the three variant formats.
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode an opaque RGB image into `format` at the format's fixed quality.
    pub fn encode(img: &DynamicImage, format: VariantFormat) -> Result<Vec<u8>, ProcessingError> {
        match format {
            VariantFormat::Jpeg => Self::compress_jpeg(img, format.quality() as u8),
            VariantFormat::WebP => Self::compress_webp(img, format.quality()),
            VariantFormat::Avif => Self::compress_avif(img, format.quality()),
        }
    }

    fn compress_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessingError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut buffer = Vec::with_capacity((width * height) as usize / 4);
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .write_image(rgb_img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| ProcessingError::encode(VariantFormat::Jpeg, e))?;

        Ok(buffer)
    }

    fn compress_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, ProcessingError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let encoder = webp::Encoder::from_rgb(rgb_img.as_raw(), width, height);
        let webp_data = encoder
            .encode_simple(false, quality)
            .map_err(|e| ProcessingError::encode(VariantFormat::WebP, format!("{:?}", e)))?;

        Ok(webp_data.to_vec())
    }

    #[cfg(feature = "avif")]
    fn compress_avif(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, ProcessingError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let rgb_data: Vec<rgb::RGB8> = rgb_img
            .as_raw()
            .chunks_exact(3)
            .map(|chunk| rgb::RGB8::new(chunk[0], chunk[1], chunk[2]))
            .collect();

        let img_buf = ravif::Img::new(rgb_data.as_slice(), width as usize, height as usize);

        let encoder = ravif::Encoder::new()
            .with_quality(quality)
            .with_speed(6); // Balance between speed and compression

        let avif_data = encoder
            .encode_rgb(img_buf)
            .map_err(|e| ProcessingError::encode(VariantFormat::Avif, e))?;

        Ok(avif_data.avif_file)
    }

    #[cfg(not(feature = "avif"))]
    fn compress_avif(_img: &DynamicImage, _quality: f32) -> Result<Vec<u8>, ProcessingError> {
        Err(ProcessingError::UnsupportedFormat(VariantFormat::Avif))
    }
}
