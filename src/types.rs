//! Core types for blockcodec

/// Chroma subsampling ratio
///
/// Each ratio gives the decimation factors (horizontal, vertical) for the
/// three planes in order Y, Cb, Cr. Luma is never decimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    /// No subsampling (4:4:4) - highest quality
    S444,
    /// Horizontal subsampling only (4:2:2)
    S422,
    /// Both horizontal and vertical (4:2:0)
    #[default]
    S420,
    /// Fallback for unrecognized ratio labels: 4x decimation in both directions
    Quarter,
}

impl Subsampling {
    /// Parse a ratio label such as `"4:2:0"`.
    ///
    /// Unrecognized labels select [`Subsampling::Quarter`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "4:2:0" => Subsampling::S420,
            "4:2:2" => Subsampling::S422,
            "4:4:4" => Subsampling::S444,
            _ => Subsampling::Quarter,
        }
    }

    /// Ratio label for this mode
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Subsampling::S444 => "4:4:4",
            Subsampling::S422 => "4:2:2",
            Subsampling::S420 => "4:2:0",
            Subsampling::Quarter => "4:1:0",
        }
    }

    /// Horizontal sampling factor for chroma components
    #[must_use]
    pub const fn h_factor(self) -> usize {
        match self {
            Subsampling::S444 => 1,
            Subsampling::S422 | Subsampling::S420 => 2,
            Subsampling::Quarter => 4,
        }
    }

    /// Vertical sampling factor for chroma components
    #[must_use]
    pub const fn v_factor(self) -> usize {
        match self {
            Subsampling::S444 | Subsampling::S422 => 1,
            Subsampling::S420 => 2,
            Subsampling::Quarter => 4,
        }
    }

    /// Decimation factors `(horizontal, vertical)` for plane `index` (0=Y, 1=Cb, 2=Cr)
    #[must_use]
    pub const fn factors(self, index: usize) -> (usize, usize) {
        if index == 0 {
            (1, 1)
        } else {
            (self.h_factor(), self.v_factor())
        }
    }

    /// True when chroma planes keep full resolution
    #[must_use]
    pub const fn is_full_resolution(self) -> bool {
        matches!(self, Subsampling::S444)
    }
}

impl From<&str> for Subsampling {
    fn from(label: &str) -> Self {
        Subsampling::from_label(label)
    }
}

/// How the inverse color transform maps reconstructed samples to 8-bit RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Round and clamp every sample to [0, 255], preserving absolute values
    #[default]
    Clamp,
    /// Stretch the global min..max of the whole raster to [0, 255], then truncate.
    ///
    /// Contrast-normalizing: absolute sample values are not reproduced.
    GlobalStretch,
}

/// What to do when a quantization matrix entry derives to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDivisorPolicy {
    /// Fail with [`crate::Error::ZeroQuantDivisor`]
    #[default]
    Reject,
    /// Raise zero entries to 1
    ClampToOne,
}

/// What to do when a quantized coefficient exceeds the coefficient depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Two's-complement wraparound to the configured width
    #[default]
    Wrap,
    /// Fail with [`crate::Error::CoefficientOverflow`]
    Reject,
}

/// Signed storage width of quantized coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoeffDepth {
    /// 8-bit signed
    I8,
    /// 16-bit signed
    #[default]
    I16,
}

impl CoeffDepth {
    /// Smallest representable coefficient
    #[must_use]
    pub const fn min(self) -> i32 {
        match self {
            CoeffDepth::I8 => i8::MIN as i32,
            CoeffDepth::I16 => i16::MIN as i32,
        }
    }

    /// Largest representable coefficient
    #[must_use]
    pub const fn max(self) -> i32 {
        match self {
            CoeffDepth::I8 => i8::MAX as i32,
            CoeffDepth::I16 => i16::MAX as i32,
        }
    }

    /// Truncate to this width with two's-complement wraparound
    #[inline]
    #[must_use]
    pub const fn wrap(self, value: i64) -> i16 {
        match self {
            CoeffDepth::I8 => value as i8 as i16,
            CoeffDepth::I16 => value as i16,
        }
    }
}
