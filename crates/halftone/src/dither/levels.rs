//! Grayscale and per-channel level quantization.

use super::{for_each_pixel, Halftone};
use crate::color::Rgb;

/// Luminance halftone to pure black or pure white.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Monochrome;

impl Halftone for Monochrome {
    fn halftone(&self, data: &mut [u8], width: usize, _height: usize) {
        for_each_pixel(data, width, |rgb, offset| {
            let luminance = Rgb::new(rgb[0], rgb[1], rgb[2]).luminance();
            let normalized = luminance / 255.0 + offset;
            let value = if normalized < 0.5 { 0 } else { 255 };
            rgb.fill(value);
        });
    }
}

/// Independent per-channel quantization to `levels` evenly spaced values.
///
/// With `levels = 2` every channel becomes 0 or 255; with `levels = 4` the
/// outputs are 0, 85, 170 and 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    levels: u32,
}

impl Levels {
    /// Create a quantizer; `levels` below 2 is raised to 2.
    pub fn new(levels: u32) -> Self {
        Self {
            levels: levels.max(2),
        }
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }
}

impl Halftone for Levels {
    fn halftone(&self, data: &mut [u8], width: usize, _height: usize) {
        let max_level = (self.levels - 1) as f32;
        let step = 255.0 / max_level;

        for_each_pixel(data, width, |rgb, offset| {
            for channel in rgb.iter_mut() {
                let normalized = *channel as f32 / 255.0 + offset;
                let level = (normalized * max_level).round().clamp(0.0, max_level);
                *channel = (level * step).round() as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monochrome_output_is_gray() {
        let mut data = Vec::new();
        for i in 0..16u8 {
            data.extend_from_slice(&[i * 16, 255 - i * 16, 128, 255]);
        }
        Monochrome.halftone(&mut data, 4, 4);
        for pixel in data.chunks(4) {
            assert!(pixel[..3] == [0, 0, 0] || pixel[..3] == [255, 255, 255]);
        }
    }

    #[test]
    fn test_monochrome_extremes() {
        let mut black = [0, 0, 0, 255].repeat(16);
        Monochrome.halftone(&mut black, 4, 4);
        assert!(black.chunks(4).all(|p| p[0] == 0));

        let mut white = [255, 255, 255, 255].repeat(16);
        Monochrome.halftone(&mut white, 4, 4);
        assert!(white.chunks(4).all(|p| p[0] == 255));
    }

    #[test]
    fn test_levels_minimum_is_two() {
        assert_eq!(Levels::new(0).levels(), 2);
        assert_eq!(Levels::new(1).levels(), 2);
        assert_eq!(Levels::new(3).levels(), 3);
    }

    #[test]
    fn test_four_levels_output_values() {
        let mut data = Vec::new();
        for i in 0..=255u8 {
            data.extend_from_slice(&[i, i, i, 255]);
        }
        Levels::new(4).halftone(&mut data, 16, 16);
        for pixel in data.chunks(4) {
            assert!(
                [0, 85, 170, 255].contains(&pixel[0]),
                "unexpected level {}",
                pixel[0]
            );
        }
    }

    #[test]
    fn test_channels_quantized_independently() {
        // Saturated primaries stay saturated at two levels
        let mut data = [255, 0, 0, 255].repeat(16);
        Levels::new(2).halftone(&mut data, 4, 4);
        assert!(data.chunks(4).all(|p| p[..3] == [255, 0, 0]));
    }

    #[test]
    fn test_mid_gray_two_levels_mixes() {
        let mut data = [128, 128, 128, 255].repeat(16);
        Levels::new(2).halftone(&mut data, 4, 4);
        let white = data.chunks(4).filter(|p| p[0] == 255).count();
        // Same split as the two-color halftone: 8 of 16 cells
        assert_eq!(white, 8);
    }
}
