//! Domain-critical regression tests for srcl-halftone.
//!
//! Each test documents the regression it guards against.

use crate::buffer::PixelBuffer;
use crate::color::{parse_color, Rgb};
use crate::dither::bayer::BAYER_4X4;
use crate::dither::{apply_dither, DitherOptions, TwoColorPalette};

/// A deterministic "photo": smooth gradients in all three channels.
fn gradient(width: u32, height: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / width.max(1)) as u8);
            data.push((y * 255 / height.max(1)) as u8);
            data.push(((x + y) * 127 / (width + height).max(1)) as u8);
            data.push(((x * 7 + y * 13) % 256) as u8);
        }
    }
    PixelBuffer::from_raw(width, height, data).unwrap()
}

// ========================================================================
// Color parsing round-trips
// ========================================================================

/// If this breaks, it means: `rgb()` parsing loses or rounds integer
/// channels, so theme colors drift from their declared values.
#[test]
fn test_rgb_integers_round_trip_exactly() {
    for r in (0..=255u16).step_by(5) {
        for g in [0u16, 1, 127, 128, 254, 255] {
            let b = 255 - r;
            let text = format!("rgb({r}, {g}, {b})");
            assert_eq!(
                parse_color(&text),
                Some(Rgb::new(r as u8, g as u8, b as u8)),
                "REGRESSION: {text} did not round-trip"
            );
        }
    }
}

/// If this breaks, it means: `#rrggbb` decoding disagrees with manual
/// byte-pair decoding (e.g. channel order or endianness is wrong).
#[test]
fn test_hex6_matches_manual_decoding() {
    for value in [0x000000u32, 0x123456, 0xabcdef, 0xff0080, 0x00ff00, 0xffffff, 0x0a0b0c] {
        let text = format!("#{value:06x}");
        let manual = Rgb::new(
            u8::from_str_radix(&text[1..3], 16).unwrap(),
            u8::from_str_radix(&text[3..5], 16).unwrap(),
            u8::from_str_radix(&text[5..7], 16).unwrap(),
        );
        assert_eq!(parse_color(&text), Some(manual), "REGRESSION: {text}");
        assert_eq!(parse_color(&text.to_uppercase()), Some(manual));
    }
}

// ========================================================================
// Two-color halftone
// ========================================================================

/// If this breaks, it means: the two-color path is blending or
/// interpolating instead of choosing exactly paper or ink.
#[test]
fn test_two_color_output_is_strictly_binary() {
    let paper = Rgb::new(232, 226, 210);
    let ink = Rgb::new(28, 24, 90);
    let options = DitherOptions::new().two_color(TwoColorPalette::new(paper, ink));

    let mut buffer = gradient(37, 23);
    apply_dither(&mut buffer, &options);

    for pixel in buffer.pixels() {
        let rgb = Rgb::new(pixel[0], pixel[1], pixel[2]);
        assert!(
            rgb == paper || rgb == ink,
            "REGRESSION: two-color output produced {rgb}"
        );
    }
}

/// If this breaks, it means: the engine applies a plain 0.5 threshold
/// instead of ordered dithering. A uniform mid-gray must become a
/// checkerboard following the Bayer table, not a flat fill.
#[test]
fn test_mid_gray_two_color_is_bayer_checkerboard() {
    let mut buffer = PixelBuffer::filled(8, 8, [128, 128, 128, 255]);
    let options = DitherOptions::new().two_color(TwoColorPalette::new(Rgb::WHITE, Rgb::BLACK));
    apply_dither(&mut buffer, &options);

    let mut ink = 0;
    for y in 0..8 {
        for x in 0..8 {
            let bayer = BAYER_4X4[((y % 4) * 4 + (x % 4)) as usize];
            let expected = if bayer < 8 { 0 } else { 255 };
            let pixel = buffer.pixel(x, y);
            assert_eq!(pixel[0], expected, "REGRESSION: cell ({x}, {y}) bayer {bayer}");
            if pixel[0] == 0 {
                ink += 1;
            }
            // Checkerboard: horizontally and vertically adjacent cells differ
            if x > 0 {
                assert_ne!(pixel[0], buffer.pixel(x - 1, y)[0]);
            }
            if y > 0 {
                assert_ne!(pixel[0], buffer.pixel(x, y - 1)[0]);
            }
        }
    }
    assert_eq!(ink, 32, "REGRESSION: expected exactly half ink");
}

// ========================================================================
// Level quantization
// ========================================================================

/// If this breaks, it means: two-level color quantization leaks
/// intermediate values.
#[test]
fn test_two_levels_color_is_binary_per_channel() {
    let mut buffer = gradient(64, 16);
    apply_dither(&mut buffer, &DitherOptions::new().levels(2).monochrome(false));
    for pixel in buffer.pixels() {
        for &c in &pixel[..3] {
            assert!(c == 0 || c == 255, "REGRESSION: channel value {c}");
        }
    }
}

/// If this breaks, it means: the alpha channel is being rewritten, which
/// would punch holes in (or fill) transparent images.
#[test]
fn test_alpha_preserved() {
    let pristine = gradient(16, 16);
    for options in [
        DitherOptions::new().levels(3),
        DitherOptions::new().monochrome(true),
        DitherOptions::new().palette(vec![Rgb::BLACK, Rgb::WHITE]),
        DitherOptions::new().two_color(TwoColorPalette::default()),
    ] {
        let mut buffer = pristine.clone();
        apply_dither(&mut buffer, &options);
        for (before, after) in pristine.pixels().zip(buffer.pixels()) {
            assert_eq!(before[3], after[3], "REGRESSION: alpha changed");
        }
    }
}

// ========================================================================
// Determinism
// ========================================================================

/// If this breaks, it means: hidden randomness or state crept into the
/// engine, so re-rendering a cached image flickers.
#[test]
fn test_reapplying_to_pristine_copy_is_byte_identical() {
    let pristine = gradient(33, 17);
    for options in [
        DitherOptions::new(),
        DitherOptions::new().levels(5),
        DitherOptions::new().monochrome(true),
        DitherOptions::new().palette(vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255), Rgb::BLACK]),
        DitherOptions::new().two_color(TwoColorPalette::default()),
    ] {
        let mut first = pristine.clone();
        apply_dither(&mut first, &options);
        let mut second = pristine.clone();
        apply_dither(&mut second, &options);
        assert_eq!(first, second, "REGRESSION: non-deterministic for {:?}", options.mode());
    }
}

/// If this breaks, it means: dithering is no longer idempotent for
/// two-color output. Re-dithering an already binary image must not change
/// it, because pure paper/ink sit far from the 0.5 threshold.
#[test]
fn test_two_color_black_white_is_idempotent() {
    let options = DitherOptions::new().two_color(TwoColorPalette::default());
    let mut once = gradient(20, 20);
    apply_dither(&mut once, &options);
    let mut twice = once.clone();
    apply_dither(&mut twice, &options);
    assert_eq!(once, twice);
}
