//! Parser for computed-style color strings.

use super::Rgb;

/// Parse a color string into an [`Rgb`].
///
/// Accepted forms:
/// - `rgb(r, g, b)` and `rgba(r, g, b, a)`: case-insensitive, arbitrary
///   whitespace, decimal channels; alpha is ignored. The function may appear
///   anywhere in the input, so values such as `"color: rgb(1, 2, 3)"` parse.
/// - `#rrggbb` and `#rgb` (each nibble doubled), case-insensitive.
///
/// Channels are rounded to the nearest integer and clamped to 0..=255.
/// Returns `None` for empty or unparseable input; this function never panics.
///
/// # Examples
///
/// ```
/// use srcl_halftone::{parse_color, Rgb};
///
/// assert_eq!(parse_color("rgba( 10 ,20,30 , 0.5)"), Some(Rgb::new(10, 20, 30)));
/// assert_eq!(parse_color("rgb(300, 127.6, 0)"), Some(Rgb::new(255, 128, 0)));
/// assert_eq!(parse_color("#FFF"), Some(Rgb::WHITE));
/// assert_eq!(parse_color(""), None);
/// ```
pub fn parse_color(value: &str) -> Option<Rgb> {
    if value.is_empty() {
        return None;
    }

    if let Some(color) = find_rgb_function(value) {
        return Some(color);
    }

    parse_hex(value.trim())
}

/// Scan for the first `rgb(`/`rgba(` occurrence whose arguments parse.
fn find_rgb_function(value: &str) -> Option<Rgb> {
    let bytes = value.as_bytes();
    if bytes.len() < 3 {
        return None;
    }

    for start in 0..=bytes.len() - 3 {
        if bytes[start..start + 3].eq_ignore_ascii_case(b"rgb") {
            // "rgb" is ASCII, so start + 3 is a char boundary
            if let Some(color) = parse_rgb_arguments(&value[start + 3..]) {
                return Some(color);
            }
        }
    }

    None
}

/// Parse `a?( r , g , b` following an `rgb` keyword. Anything after the
/// third channel (alpha, closing paren) is ignored.
fn parse_rgb_arguments(rest: &str) -> Option<Rgb> {
    let mut cursor = Cursor::new(rest);
    cursor.eat_ignore_case('a');
    if !cursor.eat('(') {
        return None;
    }

    let mut channels = [0.0f32; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        if i > 0 {
            cursor.skip_whitespace();
            if !cursor.eat(',') {
                return None;
            }
        }
        cursor.skip_whitespace();
        *channel = cursor.number()?;
    }

    Some(Rgb::from_f32(channels[0], channels[1], channels[2]))
}

fn parse_hex(value: &str) -> Option<Rgb> {
    let digits = value.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match digits.len() {
        6 => {
            let int = u32::from_str_radix(digits, 16).ok()?;
            Some(Rgb::new(
                ((int >> 16) & 0xff) as u8,
                ((int >> 8) & 0xff) as u8,
                (int & 0xff) as u8,
            ))
        }
        3 => {
            // Shorthand: 0xF -> 0xFF
            let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|v| v * 17);
            Some(Rgb::new(nibble(0).ok()?, nibble(1).ok()?, nibble(2).ok()?))
        }
        _ => None,
    }
}

/// Minimal forward-only scanner over the argument list.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(rest: &'a str) -> Self {
        Self { rest }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, expected: char) -> bool {
        match self.rest.strip_prefix(expected) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn eat_ignore_case(&mut self, expected: char) -> bool {
        self.eat(expected.to_ascii_lowercase()) || self.eat(expected.to_ascii_uppercase())
    }

    /// Consume a run of `[0-9.]` and interpret its longest numeric prefix,
    /// so `"12.5.1"` reads as `12.5`.
    fn number(&mut self) -> Option<f32> {
        let len = self
            .rest
            .bytes()
            .take_while(|b| b.is_ascii_digit() || *b == b'.')
            .count();
        if len == 0 {
            return None;
        }

        let run = &self.rest[..len];
        self.rest = &self.rest[len..];

        let numeric = match run.match_indices('.').nth(1) {
            Some((second_dot, _)) => &run[..second_dot],
            None => run,
        };
        if !numeric.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        numeric.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_function() {
        assert_eq!(parse_color("rgb(0,0,0)"), Some(Rgb::BLACK));
        assert_eq!(parse_color("rgb(255, 255, 255)"), Some(Rgb::WHITE));
        assert_eq!(parse_color("rgb(  1 ,2,   3  )"), Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_rgba_ignores_alpha() {
        assert_eq!(parse_color("rgba(10, 20, 30, 0)"), Some(Rgb::new(10, 20, 30)));
        assert_eq!(parse_color("rgba(10,20,30,1)"), Some(Rgb::new(10, 20, 30)));
    }

    #[test]
    fn test_rgb_case_insensitive() {
        assert_eq!(parse_color("RGB(1, 2, 3)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_color("RgBa(1, 2, 3, 0.5)"), Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_rgb_fractional_and_out_of_range() {
        assert_eq!(parse_color("rgb(0.4, 0.5, 254.5)"), Some(Rgb::new(0, 1, 255)));
        assert_eq!(parse_color("rgb(256, 999, 12)"), Some(Rgb::new(255, 255, 12)));
    }

    #[test]
    fn test_rgb_embedded_in_text() {
        assert_eq!(
            parse_color("background: rgb(4, 5, 6) none"),
            Some(Rgb::new(4, 5, 6))
        );
    }

    #[test]
    fn test_rgb_malformed() {
        assert_eq!(parse_color("rgb(1, 2)"), None);
        assert_eq!(parse_color("rgb 1, 2, 3"), None);
        assert_eq!(parse_color("rgb(-1, 2, 3)"), None);
        assert_eq!(parse_color("rgb(., 2, 3)"), None);
        assert_eq!(parse_color("rgb(1 2 3)"), None);
    }

    #[test]
    fn test_rgb_multiple_dots_reads_prefix() {
        assert_eq!(parse_color("rgb(1.5.9, 2, 3)"), Some(Rgb::new(2, 2, 3)));
        assert_eq!(parse_color("rgb(7., 2, 3)"), Some(Rgb::new(7, 2, 3)));
    }

    #[test]
    fn test_hex6() {
        assert_eq!(parse_color("#000000"), Some(Rgb::BLACK));
        assert_eq!(parse_color("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(parse_color("#FF8000"), Some(Rgb::new(255, 128, 0)));
    }

    #[test]
    fn test_hex3_doubles_nibbles() {
        assert_eq!(parse_color("#f80"), Some(Rgb::new(0xff, 0x88, 0x00)));
        assert_eq!(parse_color("#ABC"), Some(Rgb::new(0xaa, 0xbb, 0xcc)));
    }

    #[test]
    fn test_hex_rejects_other_lengths() {
        assert_eq!(parse_color("#ffff"), None);
        assert_eq!(parse_color("#ffffffff"), None);
        assert_eq!(parse_color("ffffff"), None);
        assert_eq!(parse_color("#gggggg"), None);
        assert_eq!(parse_color("#+12345"), None);
    }

    #[test]
    fn test_hex_surrounding_whitespace() {
        assert_eq!(parse_color("  #123456\n"), Some(Rgb::new(0x12, 0x34, 0x56)));
    }

    #[test]
    fn test_unparseable_returns_none() {
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("   "), None);
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("rg"), None);
        assert_eq!(parse_color("hsl(0, 100%, 50%)"), None);
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        assert_eq!(parse_color("ÿrgb(1,2,3)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_color("#ééé"), None);
        assert_eq!(parse_color("ŕgb"), None);
    }
}
