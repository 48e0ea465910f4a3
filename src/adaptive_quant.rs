//! Saliency-driven adaptive quantization
//!
//! Dynamic mode picks a quantization matrix per block. The base quality is
//! widened into a local working range, and each block's saliency score
//! (0..=255) selects a quality inside that range linearly: salient blocks
//! get finer quantization, flat ones coarser.
//!
//! # Algorithm Overview
//!
//! 1. **local_quality_range()** - `(0, 2q)` below 20, `(2q - 100, 100)` above
//!    80, `(q - 20, q + 20)` otherwise
//! 2. **block_scores()** - one score per block; chroma blocks under
//!    subsampling average the luma-block neighbourhood they cover
//! 3. **dynamic_quality()** - maps a score into the range
//! 4. **per_block_plan()** - derives one static-mode matrix per block
//!
//! The saliency map itself is produced outside this crate.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::consts::MIN_QUALITY;
use crate::error::{Error, Result};
use crate::quant::{QuantMatrix, QuantPlan};
use crate::types::ZeroDivisorPolicy;

/// Per-pixel importance scores in [0, 255].
///
/// Expected to be block-homogeneous: every pixel of a source block carries
/// the block's score. Only the score at each block origin is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SaliencyRecord")]
pub struct SaliencyMap {
    width: usize,
    height: usize,
    scores: Vec<u8>,
}

/// Unchecked wire form; deserialization goes through [`SaliencyMap::new`].
#[derive(Deserialize)]
struct SaliencyRecord {
    width: usize,
    height: usize,
    scores: Vec<u8>,
}

impl TryFrom<SaliencyRecord> for SaliencyMap {
    type Error = Error;

    fn try_from(record: SaliencyRecord) -> Result<Self> {
        SaliencyMap::new(record.width, record.height, record.scores)
    }
}

impl SaliencyMap {
    /// Wrap per-pixel scores in row-major order.
    pub fn new(width: usize, height: usize, scores: Vec<u8>) -> Result<Self> {
        if scores.len() != width * height {
            return Err(Error::InvalidPixelData {
                expected: width * height,
                actual: scores.len(),
            });
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    /// Every pixel carries `score`.
    #[must_use]
    pub fn uniform(width: usize, height: usize, score: u8) -> Self {
        Self {
            width,
            height,
            scores: vec![score; width * height],
        }
    }

    /// Broadcast one score per `block_size` block back to pixel resolution.
    pub fn from_block_scores(
        blocks_wide: usize,
        blocks_tall: usize,
        block_size: usize,
        block_scores: &[u8],
    ) -> Result<Self> {
        if block_scores.len() != blocks_wide * blocks_tall {
            return Err(Error::InvalidPixelData {
                expected: blocks_wide * blocks_tall,
                actual: block_scores.len(),
            });
        }
        let width = blocks_wide * block_size;
        let height = blocks_tall * block_size;
        let mut scores = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                scores.push(block_scores[(y / block_size) * blocks_wide + x / block_size]);
            }
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Per-pixel scores, row-major
    pub fn scores(&self) -> &[u8] {
        &self.scores
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.scores[y * self.width + x]
    }

    /// One score per block of a plane decimated by `(h_factor, v_factor)`.
    ///
    /// For a full-resolution plane this is the score at each block origin.
    /// Otherwise each plane block covers `h_factor × v_factor` source blocks
    /// and their scores are averaged.
    pub fn block_scores(&self, block_size: usize, h_factor: usize, v_factor: usize) -> Vec<f32> {
        let src_wide = self.width / block_size;
        let src_tall = self.height / block_size;
        let blocks_wide = src_wide / h_factor;
        let blocks_tall = src_tall / v_factor;
        let count = (h_factor * v_factor) as f32;

        let mut out = Vec::with_capacity(blocks_wide * blocks_tall);
        for br in 0..blocks_tall {
            for bc in 0..blocks_wide {
                let mut sum = 0u32;
                for dy in 0..v_factor {
                    for dx in 0..h_factor {
                        let y = (br * v_factor + dy) * block_size;
                        let x = (bc * h_factor + dx) * block_size;
                        sum += self.get(x, y) as u32;
                    }
                }
                out.push(sum as f32 / count);
            }
        }
        out
    }
}

/// Working quality range around base quality `q`.
#[must_use]
pub fn local_quality_range(quality: f32) -> (f32, f32) {
    if quality < 20.0 {
        (0.0, 2.0 * quality)
    } else if quality > 80.0 {
        (2.0 * quality - 100.0, 100.0)
    } else {
        (quality - 20.0, quality + 20.0)
    }
}

/// Effective quality for a block with saliency `score` (0..=255).
///
/// Non-decreasing in `score`; always inside [`local_quality_range`].
#[inline]
#[must_use]
pub fn dynamic_quality(score: f32, quality: f32) -> f32 {
    let (lo, hi) = local_quality_range(quality);
    let t = score.clamp(0.0, 255.0) / 255.0;
    lo + (hi - lo) * t
}

/// One quantization matrix per block of a plane.
///
/// `factors` are the plane's decimation factors; block qualities are
/// floored at [`MIN_QUALITY`] before derivation.
pub fn per_block_plan(
    saliency: &SaliencyMap,
    quality: f32,
    block_size: usize,
    factors: (usize, usize),
    policy: ZeroDivisorPolicy,
) -> QuantPlan {
    let (h_factor, v_factor) = factors;
    let blocks_wide = saliency.width() / block_size / h_factor;
    let scores = saliency.block_scores(block_size, h_factor, v_factor);
    trace!(blocks = scores.len(), h_factor, v_factor, "per-block quantization plan");

    let matrices = scores
        .iter()
        .map(|&s| {
            let q = dynamic_quality(s, quality).max(MIN_QUALITY);
            QuantMatrix::from_quality(q, block_size).with_zero_policy(policy)
        })
        .collect();

    QuantPlan::PerBlock {
        blocks_wide,
        matrices,
    }
}
