//! Palette-constrained ordered dithering.
//!
//! Each channel is perturbed by `offset * DITHER_STRENGTH` and the noisy
//! color is mapped to the nearest palette entry by squared Euclidean RGB
//! distance. Ties resolve to the entry that appears first.

use super::{for_each_pixel, Halftone};
use crate::color::Rgb;

/// Amplitude of the Bayer perturbation in 0..=255 channel units.
pub const DITHER_STRENGTH: f32 = 48.0;

/// Ordered dithering against an arbitrary palette.
///
/// An empty palette leaves the buffer unchanged; [`DitherOptions`](super::DitherOptions)
/// never selects this mode for one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteDither<'a>(pub &'a [Rgb]);

impl Halftone for PaletteDither<'_> {
    fn halftone(&self, data: &mut [u8], width: usize, _height: usize) {
        let palette = self.0;
        if palette.is_empty() {
            return;
        }

        for_each_pixel(data, width, |rgb, offset| {
            let noise = offset * DITHER_STRENGTH;
            let noisy = [
                rgb[0] as f32 + noise,
                rgb[1] as f32 + noise,
                rgb[2] as f32 + noise,
            ];
            rgb.copy_from_slice(&find_closest(noisy, palette).to_bytes());
        });
    }
}

/// Nearest palette entry by squared distance; first entry wins ties.
///
/// `palette` must be non-empty.
fn find_closest(color: [f32; 3], palette: &[Rgb]) -> Rgb {
    let mut closest = palette[0];
    let mut min_distance = f32::INFINITY;

    for &candidate in palette {
        let distance = distance_sq(color, candidate);
        if distance < min_distance {
            min_distance = distance;
            closest = candidate;
        }
    }

    closest
}

#[inline]
fn distance_sq(color: [f32; 3], candidate: Rgb) -> f32 {
    let dr = color[0] - candidate.r as f32;
    let dg = color[1] - candidate.g as f32;
    let db = color[2] - candidate.b as f32;
    dr * dr + dg * dg + db * db
}
