//! Dithering options and mode resolution.
//!
//! This module provides [`DitherOptions`], the configuration record accepted
//! by the halftone engine, and [`DitherMode`], the single mode it resolves to.

use crate::color::Rgb;

/// Default number of quantization steps per channel.
pub const DEFAULT_LEVELS: u32 = 4;

/// A `(paper, ink)` pair for two-color halftones.
///
/// `paper` is the background/light color, `ink` the foreground/dark (or
/// accent) color. The two may be equal; the output is then a flat fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TwoColorPalette {
    pub paper: Rgb,
    pub ink: Rgb,
}

impl TwoColorPalette {
    #[inline]
    pub const fn new(paper: Rgb, ink: Rgb) -> Self {
        Self { paper, ink }
    }

    /// The same paper with a different ink (e.g. a hover highlight).
    #[inline]
    pub const fn with_ink(self, ink: Rgb) -> Self {
        Self::new(self.paper, ink)
    }
}

impl Default for TwoColorPalette {
    /// Black ink on white paper.
    fn default() -> Self {
        Self::new(Rgb::WHITE, Rgb::BLACK)
    }
}

/// Configuration for [`apply_dither`](super::apply_dither).
///
/// Several fields may be set at once; [`DitherOptions::mode`] picks one with
/// the precedence `two_color` > `palette` > `monochrome` / `levels`.
///
/// # Example
///
/// ```
/// use srcl_halftone::{DitherMode, DitherOptions, Rgb};
///
/// let options = DitherOptions::new()
///     .levels(8)
///     .palette(vec![Rgb::BLACK, Rgb::new(0, 255, 0)]);
///
/// // Palette wins over levels
/// assert!(matches!(options.mode(), DitherMode::Palette(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DitherOptions {
    /// Collapse to pure black/white by luminance when no palette or
    /// two-color pair is given.
    ///
    /// Default: `false`
    pub monochrome: bool,

    /// Quantization steps per channel for the color fallback. Values below 2
    /// are treated as 2.
    ///
    /// Default: `4`
    pub levels: u32,

    /// Map every pixel to its nearest entry after adding dither noise.
    /// Ignored when empty.
    pub palette: Vec<Rgb>,

    /// Strict two-color halftone; overrides everything else.
    pub two_color: Option<TwoColorPalette>,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            monochrome: false,
            levels: DEFAULT_LEVELS,
            palette: Vec::new(),
            two_color: None,
        }
    }
}

impl DitherOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn monochrome(mut self, enabled: bool) -> Self {
        self.monochrome = enabled;
        self
    }

    #[inline]
    pub fn levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    #[inline]
    pub fn palette(mut self, palette: Vec<Rgb>) -> Self {
        self.palette = palette;
        self
    }

    #[inline]
    pub fn two_color(mut self, pair: TwoColorPalette) -> Self {
        self.two_color = Some(pair);
        self
    }

    /// Resolve the effective mode according to option precedence.
    pub fn mode(&self) -> DitherMode<'_> {
        if let Some(pair) = self.two_color {
            return DitherMode::TwoColor(pair);
        }
        if !self.palette.is_empty() {
            return DitherMode::Palette(&self.palette);
        }
        if self.monochrome {
            return DitherMode::Monochrome;
        }
        DitherMode::Levels(self.levels.max(2))
    }
}

/// The single dithering mode selected from a [`DitherOptions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DitherMode<'a> {
    /// Luminance halftone to exactly `paper` or `ink`.
    TwoColor(TwoColorPalette),
    /// Nearest-entry mapping over a non-empty palette.
    Palette(&'a [Rgb]),
    /// Luminance halftone to pure black or white.
    Monochrome,
    /// Independent per-channel quantization; always at least 2.
    Levels(u32),
}
