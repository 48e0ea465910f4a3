//! Error types for blockcodec

use std::fmt;

use crate::pipeline::Stage;

/// Result type for blockcodec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for blockcodec operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Plane dimensions are not divisible by block size times subsampling factor
    InvalidDimensions {
        width: usize,
        height: usize,
        reason: &'static str,
    },
    /// Invalid pixel data
    InvalidPixelData {
        expected: usize,
        actual: usize,
    },
    /// Invalid quality value
    InvalidQuality {
        value: f32,
        min: f32,
        max: f32,
    },
    /// Block size must be at least 1
    InvalidBlockSize(usize),
    /// Dynamic quantization requested without a saliency map
    MissingSaliencyMap,
    /// Saliency map does not cover the image
    SaliencyMapMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A quantization matrix entry is zero, so its reciprocal is undefined
    ZeroQuantDivisor {
        plane: usize,
        index: usize,
    },
    /// A quantized coefficient does not fit the configured coefficient depth
    CoefficientOverflow {
        plane: usize,
        value: f32,
    },
    /// A stage was applied to a channel in the wrong representation
    StageMismatch {
        expected: Option<Stage>,
        found: Option<Stage>,
    },
    /// Snapshot was written by an incompatible format version
    UnsupportedSnapshotVersion(u32),
    /// Snapshot content is internally inconsistent
    InvalidSnapshot(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDimensions {
                width,
                height,
                reason,
            } => {
                write!(f, "Invalid dimensions {}x{}: {}", width, height, reason)
            }
            Error::InvalidPixelData { expected, actual } => {
                write!(f, "Expected {} bytes of pixel data, got {}", expected, actual)
            }
            Error::InvalidQuality { value, min, max } => {
                write!(f, "Quality {} out of range ({}, {}]", value, min, max)
            }
            Error::InvalidBlockSize(size) => write!(f, "Invalid block size {}", size),
            Error::MissingSaliencyMap => {
                write!(f, "Dynamic quantization requires a saliency map")
            }
            Error::SaliencyMapMismatch { expected, actual } => write!(
                f,
                "Saliency map is {}x{}, image is {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Error::ZeroQuantDivisor { plane, index } => write!(
                f,
                "Quantization divisor at position {} of plane {} is zero",
                index, plane
            ),
            Error::CoefficientOverflow { plane, value } => write!(
                f,
                "Quantized coefficient {} in plane {} exceeds coefficient depth",
                value, plane
            ),
            Error::StageMismatch { expected, found } => write!(
                f,
                "Stage mismatch: expected {}, found {}",
                stage_name(*expected),
                stage_name(*found)
            ),
            Error::UnsupportedSnapshotVersion(v) => {
                write!(f, "Unsupported snapshot version {}", v)
            }
            Error::InvalidSnapshot(reason) => write!(f, "Invalid snapshot: {}", reason),
        }
    }
}

fn stage_name(stage: Option<Stage>) -> &'static str {
    stage.map_or("raster", Stage::name)
}

impl std::error::Error for Error {}
