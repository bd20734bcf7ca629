#![allow(clippy::needless_range_loop)]

//! srcl-halftone: ordered dithering for terminal-aesthetic images
//!
//! This library turns arbitrary RGBA pixel buffers into stylized low-color
//! renderings using a fixed 4×4 Bayer threshold matrix. It has no
//! dependencies and never allocates beyond the buffer it is handed.
//!
//! # Quick Start
//!
//! ```
//! use srcl_halftone::{apply_dither, DitherOptions, PixelBuffer, Rgb, TwoColorPalette};
//!
//! let mut buffer = PixelBuffer::filled(8, 8, [128, 128, 128, 255]);
//! let options = DitherOptions::new()
//!     .two_color(TwoColorPalette::new(Rgb::WHITE, Rgb::BLACK));
//!
//! apply_dither(&mut buffer, &options);
//!
//! // Every pixel is now exactly paper or ink.
//! assert!(buffer.pixels().all(|p| p[..3] == [0, 0, 0] || p[..3] == [255, 255, 255]));
//! ```
//!
//! # Modes
//!
//! [`DitherOptions`] resolves into a single [`DitherMode`] with a fixed
//! precedence:
//!
//! | Mode | Selected when | Output |
//! |------|---------------|--------|
//! | Two-color | `two_color` is set | exactly `paper` or `ink` |
//! | Palette | non-empty `palette`, no two-color | nearest palette entry |
//! | Monochrome | `monochrome`, neither of the above | pure black / white |
//! | Levels | fallback | `levels` steps per channel |
//!
//! # Ordered Dithering
//!
//! ```text
//!        x mod 4
//!      0   1   2   3
//!    ┌───┬───┬───┬───┐
//!  0 │ 0 │ 8 │ 2 │10 │
//!    ├───┼───┼───┼───┤
//!  1 │12 │ 4 │14 │ 6 │
//!    ├───┼───┼───┼───┤
//!  2 │ 3 │11 │ 1 │ 9 │
//!    ├───┼───┼───┼───┤
//!  3 │15 │ 7 │13 │ 5 │
//!    └───┴───┴───┴───┘
//!  y mod 4
//! ```
//!
//! Each cell becomes an offset `(b + 0.5) / 16 - 0.5` in `(-0.5, 0.5)` that is
//! added to the normalized sample before quantization. The pattern is
//! deterministic: dithering the same input twice yields identical bytes.
//!
//! # Buffer Ownership
//!
//! The engine mutates the buffer it is given. Callers that need the original
//! pixels (for example to re-dither with different options) must keep their
//! own copy.

pub mod buffer;
pub mod color;
pub mod dither;

#[cfg(test)]
mod domain_tests;

pub use buffer::{BufferError, PixelBuffer};
pub use color::{parse_color, ParseColorError, Rgb};
pub use dither::{apply_dither, dither_rgba, DitherMode, DitherOptions, TwoColorPalette};
