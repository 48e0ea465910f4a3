//! Codec configuration
//!
//! [`CodecConfig`] is an immutable value passed to every stage. It is built
//! with chained setters and checked once with [`CodecConfig::validate`].

use crate::adaptive_quant::SaliencyMap;
use crate::consts::{DCTSIZE, DEFAULT_QUALITY, MAX_QUALITY};
use crate::error::{Error, Result};
use crate::types::{CoeffDepth, OverflowPolicy, RangePolicy, Subsampling, ZeroDivisorPolicy};

/// Configuration for the encode/decode pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct CodecConfig {
    quality: f32,
    block_size: usize,
    subsampling: Subsampling,
    dynamic: bool,
    saliency: Option<SaliencyMap>,
    range_policy: RangePolicy,
    zero_divisor: ZeroDivisorPolicy,
    overflow: OverflowPolicy,
    coeff_depth: CoeffDepth,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            block_size: DCTSIZE,
            subsampling: Subsampling::S420,
            dynamic: false,
            saliency: None,
            range_policy: RangePolicy::default(),
            zero_divisor: ZeroDivisorPolicy::default(),
            overflow: OverflowPolicy::default(),
            coeff_depth: CoeffDepth::default(),
        }
    }

    /// Set the quality, in (0, 100]
    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the block side length
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the chroma subsampling ratio
    ///
    /// Accepts a [`Subsampling`] or a ratio label such as `"4:2:2"`.
    pub fn subsampling(mut self, subsampling: impl Into<Subsampling>) -> Self {
        self.subsampling = subsampling.into();
        self
    }

    /// Enable or disable saliency-driven per-block quantization
    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    /// Attach the saliency map used by dynamic quantization
    pub fn saliency_map(mut self, map: SaliencyMap) -> Self {
        self.saliency = Some(map);
        self
    }

    /// Set how the inverse color transform maps samples to 8-bit
    pub fn range_policy(mut self, policy: RangePolicy) -> Self {
        self.range_policy = policy;
        self
    }

    /// Set how zero quantization divisors are handled
    pub fn zero_divisor(mut self, policy: ZeroDivisorPolicy) -> Self {
        self.zero_divisor = policy;
        self
    }

    /// Set how out-of-range quantized coefficients are handled
    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Set the storage width of quantized coefficients
    pub fn coeff_depth(mut self, depth: CoeffDepth) -> Self {
        self.coeff_depth = depth;
        self
    }

    pub fn get_quality(&self) -> f32 {
        self.quality
    }

    pub fn get_block_size(&self) -> usize {
        self.block_size
    }

    pub fn get_subsampling(&self) -> Subsampling {
        self.subsampling
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn get_saliency_map(&self) -> Option<&SaliencyMap> {
        self.saliency.as_ref()
    }

    pub fn get_range_policy(&self) -> RangePolicy {
        self.range_policy
    }

    pub fn get_zero_divisor(&self) -> ZeroDivisorPolicy {
        self.zero_divisor
    }

    pub fn get_overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    pub fn get_coeff_depth(&self) -> CoeffDepth {
        self.coeff_depth
    }

    /// Check the configuration on its own, independent of any image.
    pub fn validate(&self) -> Result<()> {
        if !(self.quality > 0.0 && self.quality <= MAX_QUALITY) {
            return Err(Error::InvalidQuality {
                value: self.quality,
                min: 0.0,
                max: MAX_QUALITY,
            });
        }
        if self.block_size == 0 {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        if self.dynamic && self.saliency.is_none() {
            return Err(Error::MissingSaliencyMap);
        }
        Ok(())
    }

    /// Check that a `width × height` image can run through every stage.
    ///
    /// Each plane must split into whole blocks after decimation, and a
    /// dynamic-mode saliency map must cover the image exactly.
    pub fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        self.validate()?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "image is empty",
            });
        }
        for index in 0..3 {
            let (h, v) = self.subsampling.factors(index);
            if width % (self.block_size * h) != 0 || height % (self.block_size * v) != 0 {
                return Err(Error::InvalidDimensions {
                    width,
                    height,
                    reason: "dimensions must be multiples of block size times subsampling factor",
                });
            }
        }
        if self.dynamic {
            if let Some(map) = &self.saliency {
                if (map.width(), map.height()) != (width, height) {
                    return Err(Error::SaliencyMapMismatch {
                        expected: (width, height),
                        actual: (map.width(), map.height()),
                    });
                }
            }
        }
        Ok(())
    }
}
