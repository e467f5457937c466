//! Test fixtures: generated images and canned CDN responses.

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

fn encode(img: &DynamicImage, format: ImageFormat) -> Bytes {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("Failed to encode fixture");
    Bytes::from(buf)
}

/// Opaque JPEG with a horizontal gradient.
pub fn jpeg(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / width.max(1)) as u8;
        Rgb([v, 128, 255 - v])
    });
    encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// PNG that is fully transparent except for a black square in the middle.
pub fn transparent_png(width: u32, height: u32) -> Bytes {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let inside = x > width / 3 && x < 2 * width / 3 && y > height / 3 && y < 2 * height / 3;
        if inside {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Upload API response for `{folder}/{stem}`.
pub fn upload_response(folder: &str, stem: &str) -> String {
    serde_json::json!({
        "public_id": format!("{}/{}", folder, stem),
        "secure_url": format!("https://res.cloudinary.com/demo/image/upload/v1717/{}/{}.jpg", folder, stem),
        "url": format!("http://res.cloudinary.com/demo/image/upload/v1717/{}/{}.jpg", folder, stem),
        "format": "jpg",
        "width": 3000,
        "height": 2000,
        "bytes": 48213
    })
    .to_string()
}
