//! PNG encoding for rendered surfaces.

use srcl_halftone::PixelBuffer;
use std::io::Cursor;

use crate::error::RenderError;

/// Encode a pixel buffer as an 8-bit RGBA PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, RenderError> {
    encode_rgba_png(buffer.width(), buffer.height(), buffer.as_raw())
}

/// Encode raw RGBA8 rows as a PNG.
pub fn encode_rgba_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyImage { width, height });
    }

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_signature_and_size() {
        let buffer = PixelBuffer::filled(3, 2, [10, 20, 30, 255]);
        let png = encode_png(&buffer).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_encode_preserves_alpha() {
        let buffer = PixelBuffer::from_raw(2, 1, vec![0, 0, 0, 0, 255, 255, 255, 128]).unwrap();
        let decoded = image::load_from_memory(&encode_png(&buffer).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        assert_eq!(decoded.get_pixel(1, 0).0[3], 128);
    }

    #[test]
    fn test_wrong_length_is_an_error() {
        assert!(matches!(
            encode_rgba_png(2, 2, &[0; 8]),
            Err(RenderError::PngEncode(_))
        ));
    }

    #[test]
    fn test_empty_image_is_an_error() {
        assert!(matches!(
            encode_rgba_png(0, 4, &[]),
            Err(RenderError::EmptyImage { width: 0, height: 4 })
        ));
    }
}
