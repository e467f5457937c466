use image::{DynamicImage, Rgb, RgbImage};

/// Composite an image onto an opaque white background.
///
/// Images without an alpha channel are only converted to RGB8. Palette
/// images are expanded to RGB(A) by the decoder, so they take the same path.
pub fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    DynamicImage::ImageRgb8(out)
}
