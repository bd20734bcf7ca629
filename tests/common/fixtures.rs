//! Test images.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Encode an RGBA image in the given format.
pub fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).expect("Failed to encode fixture");
    buf.into_inner()
}

/// Opaque flat gray PNG.
pub fn gray_png(width: u32, height: u32, value: u8) -> Vec<u8> {
    encode(
        &RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255])),
        ImageFormat::Png,
    )
}

/// Horizontal black-to-white gradient PNG.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / (width - 1).max(1)) as u8;
        Rgba([v, v, v, 255])
    });
    encode(&image, ImageFormat::Png)
}

/// Decode a PNG response body.
pub fn decode_png(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .expect("Response is not a PNG")
        .to_rgba8()
}

/// Distinct RGB colors in an image.
pub fn distinct_colors(image: &RgbaImage) -> Vec<[u8; 3]> {
    let mut colors: Vec<[u8; 3]> = image.pixels().map(|p| [p[0], p[1], p[2]]).collect();
    colors.sort_unstable();
    colors.dedup();
    colors
}
