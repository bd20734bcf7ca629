//! 8-bit RGB color sample.

use std::fmt;
use std::str::FromStr;

use super::{parse_color, ParseColorError};

/// Luminance weights (ITU-R BT.601), applied to raw 0..=255 channel values.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// A color sample with three 8-bit channels.
///
/// Channels are always within 0..=255 by construction, so any `Rgb` is a
/// valid color. Equality is plain value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Pure white, the default paper color.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Pure black, the default ink color.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array `[R, G, B]`.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Convert to a byte array `[R, G, B]`.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Create a color from floating point channels in the 0..=255 range.
    ///
    /// Each channel is rounded to the nearest integer and clamped, so
    /// out-of-range and fractional inputs are accepted.
    ///
    /// # Example
    /// ```
    /// use srcl_halftone::Rgb;
    /// assert_eq!(Rgb::from_f32(300.0, 127.5, -4.0), Rgb::new(255, 128, 0));
    /// ```
    #[inline]
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }

    /// Perceived luminance `0.299R + 0.587G + 0.114B`, in 0.0..=255.0.
    #[inline]
    pub fn luminance(self) -> f32 {
        LUMA_R * self.r as f32 + LUMA_G * self.g as f32 + LUMA_B * self.b as f32
    }
}

#[inline]
fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        color.to_bytes()
    }
}

impl fmt::Display for Rgb {
    /// Formats as lowercase `#rrggbb`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse a color using the same grammar as [`parse_color`].
    ///
    /// # Examples
    ///
    /// ```
    /// use srcl_halftone::Rgb;
    ///
    /// let ink: Rgb = "#1e1e1e".parse().unwrap();
    /// assert_eq!(ink, Rgb::new(30, 30, 30));
    ///
    /// assert!("".parse::<Rgb>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseColorError::Empty);
        }
        parse_color(s).ok_or_else(|| ParseColorError::Unrecognized(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(Rgb::WHITE.to_bytes(), [255, 255, 255]);
        assert_eq!(Rgb::BLACK.to_bytes(), [0, 0, 0]);
        assert_eq!(Rgb::default(), Rgb::BLACK);
    }

    #[test]
    fn test_from_f32_rounds_and_clamps() {
        assert_eq!(Rgb::from_f32(0.4, 0.5, 254.6), Rgb::new(0, 1, 255));
        assert_eq!(Rgb::from_f32(-10.0, 1000.0, 128.0), Rgb::new(0, 255, 128));
    }

    #[test]
    fn test_luminance_extremes() {
        assert!(Rgb::BLACK.luminance().abs() < 1e-4);
        assert!((Rgb::WHITE.luminance() - 255.0).abs() < 1e-3);
        // Green dominates perceived brightness
        assert!(Rgb::new(0, 255, 0).luminance() > Rgb::new(255, 0, 0).luminance());
        assert!(Rgb::new(255, 0, 0).luminance() > Rgb::new(0, 0, 255).luminance());
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(Rgb::new(255, 0, 16).to_string(), "#ff0010");
    }

    #[test]
    fn test_display_parses_back() {
        let color = Rgb::new(12, 200, 99);
        let parsed: Rgb = color.to_string().parse().unwrap();
        assert_eq!(parsed, color);
    }

    #[test]
    fn test_from_str_errors() {
        assert_eq!("  ".parse::<Rgb>(), Err(ParseColorError::Empty));
        assert_eq!(
            "hotpink".parse::<Rgb>(),
            Err(ParseColorError::Unrecognized("hotpink".to_string()))
        );
    }
}
