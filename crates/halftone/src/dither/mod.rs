//! Ordered (Bayer) halftone dithering.
//!
//! This module converts RGBA pixels into a low-color rendering using the
//! fixed 4×4 Bayer threshold matrix in [`bayer`].
//!
//! # Algorithms
//!
//! One implementation per [`DitherMode`], all implementing [`Halftone`]:
//!
//! - [`TwoColor`]: luminance halftone to exactly paper or ink
//! - [`PaletteDither`]: noise-perturbed nearest palette entry
//! - [`Monochrome`]: luminance halftone to black or white
//! - [`Levels`]: per-channel quantization to N steps
//!
//! Every algorithm is a single synchronous pass over the buffer: O(width ×
//! height), no extra allocation, alpha untouched.
//!
//! # Example
//!
//! ```
//! use srcl_halftone::{dither_rgba, DitherOptions};
//!
//! let mut rgba = vec![200u8; 4 * 4 * 4];
//! dither_rgba(&mut rgba, 4, 4, &DitherOptions::new().levels(2));
//! assert!(rgba.chunks(4).all(|p| p[..3].iter().all(|&c| c == 0 || c == 255)));
//! ```

pub mod bayer;
mod levels;
mod options;
mod palette;
mod two_color;

pub use levels::{Levels, Monochrome};
pub use options::{DitherMode, DitherOptions, TwoColorPalette, DEFAULT_LEVELS};
pub use palette::{PaletteDither, DITHER_STRENGTH};
pub use two_color::TwoColor;

use crate::buffer::{PixelBuffer, CHANNELS};
use bayer::threshold_offset;

/// Trait for ordered dithering algorithms.
///
/// Implementors rewrite the RGB channels of each RGBA pixel in place and
/// must leave the alpha channel untouched.
pub trait Halftone {
    /// Dither `data` (RGBA, row-major, `width * height * 4` bytes) in place.
    fn halftone(&self, data: &mut [u8], width: usize, height: usize);
}

/// Dither a [`PixelBuffer`] in place, returning it for chaining.
///
/// The buffer is owned by the engine for the duration of the call. Keep a
/// clone if the original pixels are needed afterwards.
pub fn apply_dither<'a>(buffer: &'a mut PixelBuffer, options: &DitherOptions) -> &'a mut PixelBuffer {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    dither_rgba(buffer.as_raw_mut(), width, height, options);
    buffer
}

/// Dither raw RGBA bytes in place, returning them for chaining.
///
/// # Panics
///
/// Panics if `data.len() != width * height * 4`.
pub fn dither_rgba<'a>(
    data: &'a mut [u8],
    width: usize,
    height: usize,
    options: &DitherOptions,
) -> &'a mut [u8] {
    assert_eq!(
        data.len(),
        width * height * CHANNELS,
        "RGBA buffer length does not match {width}x{height}"
    );

    match options.mode() {
        DitherMode::TwoColor(pair) => TwoColor(pair).halftone(data, width, height),
        DitherMode::Palette(colors) => PaletteDither(colors).halftone(data, width, height),
        DitherMode::Monochrome => Monochrome.halftone(data, width, height),
        DitherMode::Levels(levels) => Levels::new(levels).halftone(data, width, height),
    }

    data
}

/// Visit every pixel's RGB channels together with its Bayer offset.
#[inline]
pub(crate) fn for_each_pixel<F>(data: &mut [u8], width: usize, mut visit: F)
where
    F: FnMut(&mut [u8], f32),
{
    if width == 0 {
        return;
    }
    for (y, row) in data.chunks_exact_mut(width * CHANNELS).enumerate() {
        for (x, pixel) in row.chunks_exact_mut(CHANNELS).enumerate() {
            visit(&mut pixel[..3], threshold_offset(x, y));
        }
    }
}
