//! Error type for color parsing.

use std::fmt;

/// Error returned when a string cannot be interpreted as a color.
///
/// [`parse_color`](super::parse_color) itself returns `Option`; this error
/// exists for the [`FromStr`](std::str::FromStr) implementation on
/// [`Rgb`](super::Rgb) so typed callers can use `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseColorError {
    /// Input was empty or whitespace only
    Empty,
    /// Input did not match `rgb()`, `rgba()`, `#rgb` or `#rrggbb`
    Unrecognized(String),
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseColorError::Empty => write!(f, "empty color string"),
            ParseColorError::Unrecognized(input) => {
                write!(
                    f,
                    "unrecognized color '{}' (expected rgb(), rgba(), #rgb or #rrggbb)",
                    input
                )
            }
        }
    }
}

impl std::error::Error for ParseColorError {}
