use baitech_core::models::BoundingBox;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Dimensions of an aspect-preserving fit of `width` x `height` into `bbox`.
///
/// Never upscales: sources that already fit keep their size. The longer
/// relative side lands exactly on the box edge.
pub fn target_dimensions(width: u32, height: u32, bbox: BoundingBox) -> (u32, u32) {
    if bbox.contains(width, height) || width == 0 || height == 0 {
        return (width, height);
    }

    let ratio = f64::min(
        bbox.width as f64 / width as f64,
        bbox.height as f64 / height as f64,
    );

    let w = ((width as f64 * ratio).round() as u32).clamp(1, bbox.width);
    let h = ((height as f64 * ratio).round() as u32).clamp(1, bbox.height);
    (w, h)
}

/// Downscale `img` into `bbox` with a Lanczos3 filter.
pub fn fit_within(img: &DynamicImage, bbox: BoundingBox) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (target_w, target_h) = target_dimensions(width, height, bbox);

    if (target_w, target_h) == (width, height) {
        return img.clone();
    }

    img.resize_exact(target_w, target_h, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_fits_width() {
        assert_eq!(
            target_dimensions(3000, 2000, BoundingBox::new(600, 600)),
            (600, 400)
        );
    }

    #[test]
    fn test_portrait_fits_height() {
        assert_eq!(
            target_dimensions(1000, 4000, BoundingBox::new(1200, 1200)),
            (300, 1200)
        );
    }

    #[test]
    fn test_never_upscales() {
        assert_eq!(
            target_dimensions(100, 80, BoundingBox::new(600, 600)),
            (100, 80)
        );
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(
            target_dimensions(10000, 2, BoundingBox::new(150, 150)),
            (150, 1)
        );
    }

    #[test]
    fn test_fit_within_resizes_image() {
        let img = DynamicImage::new_rgb8(800, 200);
        let resized = fit_within(&img, BoundingBox::new(150, 150));
        assert_eq!(resized.dimensions(), (150, 38));
    }
}
