//! Quantization matrices and the quantize/dequantize stage
//!
//! Matrices are derived from the standard luminance base table scaled by
//! the usual quality factor. A [`QuantPlan`] holds either one shared matrix
//! (static mode) or one matrix per block (dynamic mode, see
//! [`crate::adaptive_quant`]).

use tracing::trace;

use crate::block::BlockGrid;
use crate::consts::{DCTSIZE, STD_LUMA_QUANT};
use crate::error::{Error, Result};
use crate::types::{CoeffDepth, OverflowPolicy, ZeroDivisorPolicy};

/// Quality scale factor: `5000/q` below 50, `200 - 2q` from 50 up.
#[inline]
#[must_use]
pub fn scale_factor(quality: f32) -> f64 {
    let q = quality as f64;
    if q < 50.0 {
        5000.0 / q
    } else {
        200.0 - 2.0 * q
    }
}

/// `n×n` quantization divisors in natural (row-major) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantMatrix {
    size: usize,
    values: Vec<u16>,
}

impl QuantMatrix {
    /// Wrap explicit divisors.
    pub fn new(size: usize, values: Vec<u16>) -> Self {
        debug_assert_eq!(values.len(), size * size);
        Self { size, values }
    }

    /// Derive a matrix from `quality` for blocks of side `size`.
    ///
    /// Entry = `floor((S·base + 50) / 100)`, saturating at `u16::MAX` for
    /// very small qualities. There is no lower clamp; entries reach zero near
    /// quality 100.
    pub fn from_quality(quality: f32, size: usize) -> Self {
        let scale = scale_factor(quality);
        let mut values = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                let base = base_entry(i, j, size) as f64;
                let val = ((scale * base + 50.0) / 100.0).floor();
                values.push(val.min(u16::MAX as f64) as u16);
            }
        }
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Divisors in natural order
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    /// Position of the first zero divisor, if any
    pub fn first_zero(&self) -> Option<usize> {
        self.values.iter().position(|&v| v == 0)
    }

    /// Apply the zero-divisor policy: raise zeros to 1 or leave them for
    /// [`quantize`] to reject.
    pub fn with_zero_policy(mut self, policy: ZeroDivisorPolicy) -> Self {
        if policy == ZeroDivisorPolicy::ClampToOne {
            for v in &mut self.values {
                *v = (*v).max(1);
            }
        }
        self
    }
}

/// Base table entry for position (i, j) of an `size×size` block.
/// Other sizes resample the 8x8 table by nearest neighbour.
fn base_entry(i: usize, j: usize, size: usize) -> u16 {
    if size == DCTSIZE {
        STD_LUMA_QUANT[i * DCTSIZE + j]
    } else {
        let bi = i * DCTSIZE / size;
        let bj = j * DCTSIZE / size;
        STD_LUMA_QUANT[bi * DCTSIZE + bj]
    }
}

/// Quantization matrices for one plane.
#[derive(Clone, Debug, PartialEq)]
pub enum QuantPlan {
    /// One matrix for every block
    Shared(QuantMatrix),
    /// One matrix per block, block-raster order
    PerBlock {
        blocks_wide: usize,
        matrices: Vec<QuantMatrix>,
    },
}

impl QuantPlan {
    /// Static plan at `quality`
    pub fn shared(quality: f32, size: usize, policy: ZeroDivisorPolicy) -> Self {
        QuantPlan::Shared(QuantMatrix::from_quality(quality, size).with_zero_policy(policy))
    }

    /// Matrix applied to block (br, bc)
    pub fn matrix(&self, br: usize, bc: usize) -> &QuantMatrix {
        match self {
            QuantPlan::Shared(m) => m,
            QuantPlan::PerBlock {
                blocks_wide,
                matrices,
            } => &matrices[br * blocks_wide + bc],
        }
    }

    fn matrices(&self) -> &[QuantMatrix] {
        match self {
            QuantPlan::Shared(m) => std::slice::from_ref(m),
            QuantPlan::PerBlock { matrices, .. } => matrices,
        }
    }

    /// Fail if any divisor is zero
    pub fn check_divisors(&self, plane: usize) -> Result<()> {
        for m in self.matrices() {
            if let Some(index) = m.first_zero() {
                return Err(Error::ZeroQuantDivisor { plane, index });
            }
        }
        Ok(())
    }
}

/// Quantize coefficient blocks: multiply by the reciprocal divisor, truncate
/// toward zero, then fit the result to `depth`.
pub fn quantize(
    grid: &BlockGrid<f32>,
    plan: &QuantPlan,
    depth: CoeffDepth,
    overflow: OverflowPolicy,
    plane: usize,
) -> Result<BlockGrid<i16>> {
    plan.check_divisors(plane)?;
    trace!(plane, blocks = grid.total_blocks(), "quantizing plane");

    let (min, max) = (depth.min() as f32, depth.max() as f32);
    let mut out = BlockGrid::new(grid.blocks_wide(), grid.blocks_tall(), grid.block_size());
    for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            let divisors = plan.matrix(br, bc).values();
            let src = grid.block(br, bc);
            let dst = out.block_mut(br, bc);
            for k in 0..src.len() {
                let value = (src[k] * (1.0 / divisors[k] as f32)).trunc();
                if (value < min || value > max) && overflow == OverflowPolicy::Reject {
                    return Err(Error::CoefficientOverflow { plane, value });
                }
                dst[k] = depth.wrap(value as i64);
            }
        }
    }
    Ok(out)
}

/// Dequantize: multiply each coefficient by its divisor.
pub fn dequantize(grid: &BlockGrid<i16>, plan: &QuantPlan) -> BlockGrid<f32> {
    let mut out = BlockGrid::new(grid.blocks_wide(), grid.blocks_tall(), grid.block_size());
    for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            let divisors = plan.matrix(br, bc).values();
            let src = grid.block(br, bc);
            let dst = out.block_mut(br, bc);
            for k in 0..src.len() {
                dst[k] = src[k] as f32 * divisors[k] as f32;
            }
        }
    }
    out
}
