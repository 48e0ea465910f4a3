//! Block-wise 2D DCT for the frequency-transform stage
//!
//! Orthonormal type-II forward transform and its type-III inverse, applied
//! independently to every block of a [`BlockGrid`]. Samples are level-shifted
//! by a caller-supplied constant before the forward transform and shifted
//! back after the inverse.

use crate::block::BlockGrid;

/// Cosine basis for an `n×n` transform.
///
/// `cos[u * n + x] = cos((2x + 1) · u · π / 2n)`, `norm[0] = √(1/n)`,
/// `norm[u > 0] = √(2/n)`.
#[derive(Debug, Clone)]
pub struct DctBasis {
    n: usize,
    cos: Vec<f64>,
    norm: Vec<f64>,
}

impl DctBasis {
    pub fn new(n: usize) -> Self {
        let mut cos = vec![0.0f64; n * n];
        for u in 0..n {
            for x in 0..n {
                cos[u * n + x] =
                    ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / (2 * n) as f64).cos();
            }
        }
        let mut norm = vec![(2.0 / n as f64).sqrt(); n];
        if let Some(first) = norm.first_mut() {
            *first = (1.0 / n as f64).sqrt();
        }
        Self { n, cos, norm }
    }

    pub fn size(&self) -> usize {
        self.n
    }
}

/// Forward DCT of one block in place, after subtracting `shift`.
pub fn forward_dct_block(block: &mut [f32], basis: &DctBasis, shift: f32) {
    let n = basis.n;
    debug_assert_eq!(block.len(), n * n);
    let (cos, c) = (&basis.cos, &basis.norm);

    // Rows first.
    let mut temp = vec![0.0f64; n * n];
    for row in 0..n {
        for u in 0..n {
            let mut sum = 0.0;
            for x in 0..n {
                sum += (block[row * n + x] - shift) as f64 * cos[u * n + x];
            }
            temp[row * n + u] = c[u] * sum;
        }
    }

    // Then columns.
    for col in 0..n {
        for v in 0..n {
            let mut sum = 0.0;
            for y in 0..n {
                sum += temp[y * n + col] * cos[v * n + y];
            }
            block[v * n + col] = (c[v] * sum) as f32;
        }
    }
}

/// Inverse DCT of one block in place, then add `shift` back.
pub fn inverse_dct_block(block: &mut [f32], basis: &DctBasis, shift: f32) {
    let n = basis.n;
    debug_assert_eq!(block.len(), n * n);
    let (cos, c) = (&basis.cos, &basis.norm);

    // Columns first.
    let mut temp = vec![0.0f64; n * n];
    for col in 0..n {
        for y in 0..n {
            let mut sum = 0.0;
            for v in 0..n {
                sum += c[v] * block[v * n + col] as f64 * cos[v * n + y];
            }
            temp[y * n + col] = sum;
        }
    }

    // Then rows.
    for row in 0..n {
        for x in 0..n {
            let mut sum = 0.0;
            for u in 0..n {
                sum += c[u] * temp[row * n + u] * cos[u * n + x];
            }
            block[row * n + x] = sum as f32 + shift;
        }
    }
}

/// Forward transform of every block in the grid.
pub fn forward_dct(grid: &BlockGrid<f32>, shift: f32) -> BlockGrid<f32> {
    let basis = DctBasis::new(grid.block_size());
    let mut out = grid.clone();
    for block in out.blocks_mut() {
        forward_dct_block(block, &basis, shift);
    }
    out
}

/// Inverse transform of every block in the grid.
pub fn inverse_dct(grid: &BlockGrid<f32>, shift: f32) -> BlockGrid<f32> {
    let basis = DctBasis::new(grid.block_size());
    let mut out = grid.clone();
    for block in out.blocks_mut() {
        inverse_dct_block(block, &basis, shift);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{LEVEL_SHIFT, LEVEL_SHIFT_UNIT};

    #[test]
    fn test_dct_dc_only() {
        // A uniform block should have only a DC component
        let basis = DctBasis::new(8);
        let mut block = [200.0f32; 64];
        forward_dct_block(&mut block, &basis, LEVEL_SHIFT);

        // DC = 8 * (200 - 128) under the orthonormal scaling
        assert!((block[0] - 576.0).abs() < 1e-3, "DC = {}", block[0]);
        for (i, ac) in block.iter().enumerate().skip(1) {
            assert!(ac.abs() < 1e-3, "AC[{}] = {}", i, ac);
        }
    }

    #[test]
    fn test_mid_gray_is_zero() {
        let basis = DctBasis::new(8);
        let mut block = [128.0f32; 64];
        forward_dct_block(&mut block, &basis, LEVEL_SHIFT);
        assert!(block.iter().all(|v| v.abs() < 1e-4));
    }

    #[test]
    fn test_roundtrip_various_sizes() {
        for n in [1usize, 2, 4, 8, 16] {
            let basis = DctBasis::new(n);
            let original: Vec<f32> = (0..n * n).map(|i| ((i * 37) % 251) as f32).collect();
            let mut block = original.clone();
            forward_dct_block(&mut block, &basis, LEVEL_SHIFT);
            inverse_dct_block(&mut block, &basis, LEVEL_SHIFT);
            for (a, b) in original.iter().zip(&block) {
                assert!((a - b).abs() < 1e-2, "n={}: {} vs {}", n, a, b);
            }
        }
    }

    #[test]
    fn test_unit_scale_shift() {
        let basis = DctBasis::new(4);
        let mut block = [0.5f32; 16];
        forward_dct_block(&mut block, &basis, LEVEL_SHIFT_UNIT);
        assert!(block.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_blocks_are_independent() {
        // Two blocks: one flat, one with an edge. The flat block must stay DC-only.
        let mut data = vec![100.0f32; 64];
        data.extend((0..64).map(|i| if i % 8 < 4 { 0.0 } else { 255.0 }));
        let grid = BlockGrid::from_vec(2, 1, 8, data).unwrap();
        let coeffs = forward_dct(&grid, LEVEL_SHIFT);
        assert!(coeffs.block(0, 0)[1..].iter().all(|v| v.abs() < 1e-3));
        assert!(coeffs.block(0, 1)[1].abs() > 100.0);

        let back = inverse_dct(&coeffs, LEVEL_SHIFT);
        for (a, b) in grid.as_slice().iter().zip(back.as_slice()) {
            assert!((a - b).abs() < 1e-2);
        }
    }
}
