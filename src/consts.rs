//! Constants and tables for the block-transform pipeline
//!
//! Base quantization table, color-space matrix and the default
//! configuration values.

/// Default block dimension
pub const DCTSIZE: usize = 8;

/// Default block size (8x8 = 64)
pub const DCTSIZE2: usize = 64;

/// Default quality when none is configured
pub const DEFAULT_QUALITY: f32 = 75.0;

/// Lower bound for any quality that feeds a matrix derivation
pub const MIN_QUALITY: f32 = 1.0;

/// Upper bound of the quality domain (inclusive)
pub const MAX_QUALITY: f32 = 100.0;

/// Level shift for samples on the 8-bit scale
pub const LEVEL_SHIFT: f32 = 128.0;

/// Level shift for samples on the unit scale
pub const LEVEL_SHIFT_UNIT: f32 = 0.5;

/// Zigzag scan order for 8x8 blocks: maps zigzag position to natural (row-major) position.
pub const JPEG_NATURAL_ORDER: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Standard JPEG Annex K luminance quantization table
pub const STD_LUMA_QUANT: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// RGB (unit scale) to YCbCr matrix, BT.709-derived studio swing.
/// Rows produce Y, Cb, Cr before the offsets are added.
#[rustfmt::skip]
pub const RGB_TO_YCBCR: [[f32; 3]; 3] = [
    [ 65.481, 128.553,  24.966],
    [-37.797, -74.203, 112.000],
    [112.000, -93.786, -18.214],
];

/// Offsets added to Y, Cb, Cr after the matrix product
pub const YCBCR_OFFSETS: [f32; 3] = [16.0, 128.0, 128.0];
