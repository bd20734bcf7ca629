//! Two-color (single-ink) halftone.
//!
//! Each pixel's perceived luminance, normalized to 0..=1 and shifted by its
//! Bayer offset, is compared against 0.5: darker pixels take the ink color,
//! lighter ones the paper color. The output contains only those two colors.

use super::{for_each_pixel, Halftone, TwoColorPalette};
use crate::color::Rgb;

/// Two-color halftone with the given `(paper, ink)` pair.
///
/// # Example
///
/// ```
/// use srcl_halftone::dither::{Halftone, TwoColor};
/// use srcl_halftone::{Rgb, TwoColorPalette};
///
/// let pair = TwoColorPalette::new(Rgb::new(250, 245, 230), Rgb::new(40, 30, 120));
/// let mut rgba = vec![0, 0, 0, 255, 255, 255, 255, 255];
/// TwoColor(pair).halftone(&mut rgba, 2, 1);
/// assert_eq!(&rgba[..3], &[40, 30, 120]);
/// assert_eq!(&rgba[4..7], &[250, 245, 230]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoColor(pub TwoColorPalette);

impl Halftone for TwoColor {
    fn halftone(&self, data: &mut [u8], width: usize, _height: usize) {
        let paper = self.0.paper.to_bytes();
        let ink = self.0.ink.to_bytes();

        for_each_pixel(data, width, |rgb, offset| {
            let luminance = Rgb::new(rgb[0], rgb[1], rgb[2]).luminance();
            let normalized = luminance / 255.0 + offset;
            let color = if normalized < 0.5 { &ink } else { &paper };
            rgb.copy_from_slice(color);
        });
    }
}
