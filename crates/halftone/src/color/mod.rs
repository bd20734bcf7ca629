//! Color types and parsing
//!
//! This module provides the 8-bit [`Rgb`] sample type used throughout the
//! halftone pipeline, and [`parse_color`] for turning computed style strings
//! (`rgb()`, `rgba()`, `#rgb`, `#rrggbb`) into colors.
//!
//! # Example
//!
//! ```
//! use srcl_halftone::{parse_color, Rgb};
//!
//! assert_eq!(parse_color("rgb(255, 0, 0)"), Some(Rgb::new(255, 0, 0)));
//! assert_eq!(parse_color("#0f0"), Some(Rgb::new(0, 255, 0)));
//! assert_eq!(parse_color("transparent"), None);
//! ```

mod error;
mod parse;
mod rgb;

pub use error::ParseColorError;
pub use parse::parse_color;
pub use rgb::Rgb;
