//! RGBA pixel buffer.
//!
//! [`PixelBuffer`] is a width×height grid of 8-bit RGBA samples, row-major
//! with the origin at the top left. It is the unit of ownership handed to the
//! halftone engine.

use std::fmt;

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Error returned when raw bytes do not describe a `width × height` RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Byte length does not equal `width * height * 4`
    SizeMismatch {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },
    /// `width * height * 4` overflows `usize`
    TooLarge {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::SizeMismatch { expected, actual } => write!(
                f,
                "pixel buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            BufferError::TooLarge { width, height } => {
                write!(f, "pixel buffer too large: {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// An owned RGBA8 image.
///
/// # Example
///
/// ```
/// use srcl_halftone::PixelBuffer;
///
/// let buffer = PixelBuffer::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]).unwrap();
/// assert_eq!(buffer.pixel(1, 0), [0, 0, 255, 128]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, validating their length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(BufferError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a buffer with every pixel set to `rgba`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height * 4` overflows `usize`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// The RGBA sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Iterate over pixels as 4-byte slices in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }

    /// Overwrite this buffer's contents with `other`'s, reusing the allocation
    /// when the sizes match.
    pub fn restore_from(&mut self, other: &PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }
}

fn byte_len(width: u32, height: u32) -> Result<usize, BufferError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(BufferError::TooLarge { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_validates_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            PixelBuffer::from_raw(2, 2, vec![0; 15]),
            Err(BufferError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_empty_buffer_is_valid() {
        let buffer = PixelBuffer::from_raw(0, 10, Vec::new()).unwrap();
        assert_eq!(buffer.pixels().count(), 0);
    }

    #[test]
    fn test_filled() {
        let buffer = PixelBuffer::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(buffer.as_raw().len(), 24);
        assert!(buffer.pixels().all(|p| p == [1, 2, 3, 4]));
    }

    #[test]
    fn test_pixel_row_major() {
        let mut data = vec![0u8; 2 * 2 * 4];
        // (1, 1) is the fourth pixel
        data[12..16].copy_from_slice(&[9, 8, 7, 6]);
        let buffer = PixelBuffer::from_raw(2, 2, data).unwrap();
        assert_eq!(buffer.pixel(1, 1), [9, 8, 7, 6]);
        assert_eq!(buffer.pixel(0, 1), [0, 0, 0, 0]);
    }

    #[test]
    #[should_panic]
    fn test_pixel_out_of_bounds_panics() {
        PixelBuffer::filled(2, 2, [0; 4]).pixel(2, 0);
    }

    #[test]
    fn test_restore_from() {
        let pristine = PixelBuffer::filled(2, 2, [10, 20, 30, 40]);
        let mut working = pristine.clone();
        working.as_raw_mut().fill(0);
        assert_ne!(working, pristine);

        working.restore_from(&pristine);
        assert_eq!(working, pristine);
    }

    #[test]
    fn test_error_display() {
        let err = BufferError::SizeMismatch {
            expected: 16,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "pixel buffer size mismatch: expected 16 bytes, got 3"
        );
    }
}
