//! 4×4 Bayer threshold matrix.

/// Canonical 4×4 Bayer index pattern, row-major.
pub const BAYER_4X4: [u8; 16] = [0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5];

/// Threshold offsets `(b + 0.5) / 16 - 0.5`, each in `(-0.5, 0.5)`.
///
/// Every entry is a multiple of 1/32 and therefore exact in `f32`.
pub const BAYER_THRESHOLDS: [f32; 16] = [
    -0.46875, 0.03125, -0.34375, 0.15625, //
    0.28125, -0.21875, 0.40625, -0.09375, //
    -0.28125, 0.21875, -0.40625, 0.09375, //
    0.46875, -0.03125, 0.34375, -0.15625, //
];

/// Threshold offset for the pixel at `(x, y)`.
#[inline]
pub fn threshold_offset(x: usize, y: usize) -> f32 {
    BAYER_THRESHOLDS[(y & 3) * 4 + (x & 3)]
}
