//! Block partitioning of sample planes.
//!
//! [`BlockGrid`] stores a plane as `blocks_tall × blocks_wide` square blocks
//! of side `block_size`, each block contiguous in row-major order. The same
//! container carries spatial samples, transform coefficients and quantized
//! coefficients as the pipeline advances.

use imgref::ImgVec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Single-component sample plane.
pub type Plane = ImgVec<f32>;

/// Grid of `N×N` blocks, shape `(blocks_tall, blocks_wide, N, N)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockGrid<T> {
    blocks_tall: usize,
    blocks_wide: usize,
    block_size: usize,
    /// Flat storage: blocks_tall * blocks_wide * block_size² values.
    data: Vec<T>,
}

impl<T: Copy + Default> BlockGrid<T> {
    /// Create a grid initialized to `T::default()`.
    pub fn new(blocks_wide: usize, blocks_tall: usize, block_size: usize) -> Self {
        Self {
            blocks_tall,
            blocks_wide,
            block_size,
            data: vec![T::default(); blocks_wide * blocks_tall * block_size * block_size],
        }
    }
}

impl<T> BlockGrid<T> {
    /// Wrap existing block-raster data.
    pub fn from_vec(
        blocks_wide: usize,
        blocks_tall: usize,
        block_size: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        let expected = blocks_wide * blocks_tall * block_size * block_size;
        if data.len() != expected || block_size == 0 {
            return Err(Error::InvalidDimensions {
                width: blocks_wide * block_size,
                height: blocks_tall * block_size,
                reason: "block data length does not match grid shape",
            });
        }
        Ok(Self {
            blocks_tall,
            blocks_wide,
            block_size,
            data,
        })
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Values per block (N²)
    pub fn block_len(&self) -> usize {
        self.block_size * self.block_size
    }

    pub fn total_blocks(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    /// Block at (br, bc) in row-major order.
    pub fn block(&self, br: usize, bc: usize) -> &[T] {
        let len = self.block_len();
        let start = (br * self.blocks_wide + bc) * len;
        &self.data[start..start + len]
    }

    pub fn block_mut(&mut self, br: usize, bc: usize) -> &mut [T] {
        let len = self.block_len();
        let start = (br * self.blocks_wide + bc) * len;
        &mut self.data[start..start + len]
    }

    /// Blocks in block-raster order.
    pub fn blocks(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.block_len())
    }

    pub fn blocks_mut(&mut self) -> std::slice::ChunksExactMut<'_, T> {
        let len = self.block_len();
        self.data.chunks_exact_mut(len)
    }

    /// Raw block-raster storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Copy> BlockGrid<T> {
    /// Value at block (br, bc), intra-block row `i`, column `j`.
    pub fn get(&self, br: usize, bc: usize, i: usize, j: usize) -> T {
        debug_assert!(br < self.blocks_tall, "block row {br} >= {}", self.blocks_tall);
        debug_assert!(bc < self.blocks_wide, "block col {bc} >= {}", self.blocks_wide);
        debug_assert!(i < self.block_size && j < self.block_size);
        self.block(br, bc)[i * self.block_size + j]
    }

    /// Same shape, every value mapped.
    pub fn map<U, F: FnMut(T) -> U>(&self, f: F) -> BlockGrid<U> {
        BlockGrid {
            blocks_tall: self.blocks_tall,
            blocks_wide: self.blocks_wide,
            block_size: self.block_size,
            data: self.data.iter().copied().map(f).collect(),
        }
    }
}

/// Partition a plane into non-overlapping `n×n` blocks.
///
/// Fails unless both plane dimensions are multiples of `n`; no edge padding
/// is performed.
pub fn partition(plane: &Plane, n: usize) -> Result<BlockGrid<f32>> {
    let (width, height) = (plane.width(), plane.height());
    if n == 0 {
        return Err(Error::InvalidBlockSize(n));
    }
    if width % n != 0 || height % n != 0 {
        return Err(Error::InvalidDimensions {
            width,
            height,
            reason: "plane dimensions must be multiples of the block size",
        });
    }

    let mut grid = BlockGrid::new(width / n, height / n, n);
    for (y, row) in plane.rows().enumerate() {
        let (br, i) = (y / n, y % n);
        for (bc, chunk) in row.chunks_exact(n).enumerate() {
            grid.block_mut(br, bc)[i * n..(i + 1) * n].copy_from_slice(chunk);
        }
    }
    Ok(grid)
}

/// Reassemble blocks into a `(R·N) × (C·N)` plane.
///
/// Block (r, c) lands at rows `[r·N, (r+1)·N)` and columns `[c·N, (c+1)·N)`.
pub fn reassemble(grid: &BlockGrid<f32>) -> Plane {
    let n = grid.block_size();
    let width = grid.blocks_wide() * n;
    let height = grid.blocks_tall() * n;

    let mut buf = Vec::with_capacity(width * height);
    for y in 0..height {
        let (br, i) = (y / n, y % n);
        for bc in 0..grid.blocks_wide() {
            buf.extend_from_slice(&grid.block(br, bc)[i * n..(i + 1) * n]);
        }
    }
    ImgVec::new(buf, width, height)
}
