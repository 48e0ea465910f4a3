//! Zigzag scan order for `N×N` blocks.
//!
//! The order walks anti-diagonals `r + c = s` for `s = 0..2N-1`, alternating
//! direction: even diagonals run bottom-left to top-right, odd ones top-right
//! to bottom-left. For `N = 8` this is the standard JPEG order.
//!
//! Every size starts rightward (`0, 1, N, ...`). For odd `N` this differs
//! from scans that start downward, e.g. `0, 3, 1, ...` for `N = 3`.

use crate::block::BlockGrid;

/// Forward and inverse zigzag permutations for one block size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZigzagOrder {
    size: usize,
    /// Zigzag position -> natural (row-major) index.
    to_natural: Vec<usize>,
    /// Natural index -> zigzag position (argsort of `to_natural`).
    to_zigzag: Vec<usize>,
}

impl ZigzagOrder {
    pub fn new(size: usize) -> Self {
        let len = size * size;
        let mut to_natural = Vec::with_capacity(len);
        for s in 0..(2 * size).saturating_sub(1) {
            let r_lo = s.saturating_sub(size - 1);
            let r_hi = s.min(size - 1);
            if s % 2 == 0 {
                for r in (r_lo..=r_hi).rev() {
                    to_natural.push(r * size + (s - r));
                }
            } else {
                for r in r_lo..=r_hi {
                    to_natural.push(r * size + (s - r));
                }
            }
        }

        let mut to_zigzag = vec![0usize; len];
        for (pos, &natural) in to_natural.iter().enumerate() {
            to_zigzag[natural] = pos;
        }

        Self {
            size,
            to_natural,
            to_zigzag,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Zigzag position -> natural index
    pub fn to_natural(&self) -> &[usize] {
        &self.to_natural
    }

    /// Natural index -> zigzag position
    pub fn to_zigzag(&self) -> &[usize] {
        &self.to_zigzag
    }

    /// Reorder one row-major block into zigzag order.
    pub fn scan<T: Copy>(&self, block: &[T], out: &mut [T]) {
        debug_assert_eq!(block.len(), self.to_natural.len());
        for (dst, &natural) in out.iter_mut().zip(&self.to_natural) {
            *dst = block[natural];
        }
    }

    /// Restore row-major order from a zigzag sequence.
    pub fn unscan<T: Copy>(&self, seq: &[T], out: &mut [T]) {
        debug_assert_eq!(seq.len(), self.to_zigzag.len());
        for (dst, &pos) in out.iter_mut().zip(&self.to_zigzag) {
            *dst = seq[pos];
        }
    }
}

/// Zigzag every block of the grid. Each block of the result is a length-N² sequence.
pub fn zigzag<T: Copy + Default>(grid: &BlockGrid<T>) -> BlockGrid<T> {
    let order = ZigzagOrder::new(grid.block_size());
    let mut out = BlockGrid::new(grid.blocks_wide(), grid.blocks_tall(), grid.block_size());
    for (src, dst) in grid.blocks().zip(out.blocks_mut()) {
        order.scan(src, dst);
    }
    out
}

/// Undo [`zigzag`].
pub fn unzigzag<T: Copy + Default>(grid: &BlockGrid<T>) -> BlockGrid<T> {
    let order = ZigzagOrder::new(grid.block_size());
    let mut out = BlockGrid::new(grid.blocks_wide(), grid.blocks_tall(), grid.block_size());
    for (src, dst) in grid.blocks().zip(out.blocks_mut()) {
        order.unscan(src, dst);
    }
    out
}
