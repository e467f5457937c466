//! Image optimizer
//!
//! Produces every size x format variant for one upload. Encoding is CPU bound:
//! callers on an async runtime should use [`ImageOptimizer::optimize_blocking`],
//! which moves the work to the blocking pool. Inside, the individual encodes run
//! in parallel on rayon and are collected back in output order.

use std::io::Cursor;
use std::time::Instant;

use baitech_core::models::{SizeTag, VariantFormat};
use image::{DynamicImage, GenericImageView, ImageReader};
use rayon::prelude::*;

use crate::compression::{CodecSupport, ImageCompressor};
use crate::error::ProcessingError;
use crate::image::{fit_within, flatten_onto_white};

/// One encoded variant, ready to be stored.
#[derive(Debug, Clone)]
pub struct EncodedVariant {
    pub size: SizeTag,
    pub format: VariantFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// All variants of one upload, ordered by size then format.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub source_width: u32,
    pub source_height: u32,
    pub variants: Vec<EncodedVariant>,
}

impl OptimizedImage {
    /// Variants of the primary size, in format order.
    pub fn primary(&self) -> impl Iterator<Item = &EncodedVariant> {
        self.variants.iter().filter(|v| v.size == SizeTag::PRIMARY)
    }

    pub fn variant(&self, size: SizeTag, format: VariantFormat) -> Option<&EncodedVariant> {
        self.variants
            .iter()
            .find(|v| v.size == size && v.format == format)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageOptimizer {
    codecs: CodecSupport,
}

impl ImageOptimizer {
    pub fn new(codecs: CodecSupport) -> Self {
        Self { codecs }
    }

    pub fn codecs(&self) -> CodecSupport {
        self.codecs
    }

    /// Decode `data` and produce every variant.
    ///
    /// A decode failure or a failed JPEG/WebP encode fails the whole call.
    /// AVIF failures only drop the AVIF variant of that size.
    pub fn optimize(&self, data: &[u8]) -> Result<OptimizedImage, ProcessingError> {
        let start = Instant::now();

        let decoded = decode(data)?;
        let (source_width, source_height) = decoded.dimensions();
        let flat = flatten_onto_white(&decoded);
        drop(decoded);

        let resized: Vec<(SizeTag, DynamicImage)> = SizeTag::ALL
            .par_iter()
            .map(|size| (*size, fit_within(&flat, size.bounding_box())))
            .collect();

        let jobs: Vec<(SizeTag, &DynamicImage, VariantFormat)> = resized
            .iter()
            .flat_map(|(size, img)| {
                self.codecs
                    .formats()
                    .into_iter()
                    .map(move |format| (*size, img, format))
            })
            .collect();

        let mut encoded = Vec::with_capacity(jobs.len());
        jobs.into_par_iter()
            .map(|(size, img, format)| {
                let result = ImageCompressor::encode(img, format);
                (size, img.dimensions(), format, result)
            })
            .collect_into_vec(&mut encoded);

        let mut variants = Vec::with_capacity(encoded.len());
        for (size, (width, height), format, result) in encoded {
            match result {
                Ok(data) => variants.push(EncodedVariant {
                    size,
                    format,
                    width,
                    height,
                    data,
                }),
                Err(e) if !format.is_required() => {
                    tracing::warn!(
                        size = %size,
                        format = %format,
                        error = %e,
                        "Optional variant encode failed; skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            source_width,
            source_height,
            variant_count = variants.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image optimized"
        );

        Ok(OptimizedImage {
            source_width,
            source_height,
            variants,
        })
    }

    /// [`optimize`](Self::optimize) on tokio's blocking pool.
    pub async fn optimize_blocking<D>(&self, data: D) -> Result<OptimizedImage, ProcessingError>
    where
        D: AsRef<[u8]> + Send + 'static,
    {
        let optimizer = self.clone();
        tokio::task::spawn_blocking(move || optimizer.optimize(data.as_ref()))
            .await
            .map_err(|e| ProcessingError::Task(e.to_string()))?
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(ProcessingError::Decode(
            "unrecognized image format".to_string(),
        ));
    }

    reader
        .decode()
        .map_err(|e| ProcessingError::Decode(e.to_string()))
}
