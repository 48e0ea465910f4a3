//! Color space conversion between RGB and YCbCr
//!
//! Forward conversion scales 8-bit RGB to [0, 1] and applies the
//! BT.709-derived studio-swing matrix:
//! - Y  =  65.481 R + 128.553 G +  24.966 B + 16
//! - Cb = -37.797 R -  74.203 G + 112.000 B + 128
//! - Cr = 112.000 R -  93.786 G -  18.214 B + 128
//!
//! Output is roughly Y in [16, 235] and Cb, Cr in [16, 240]. The inverse
//! removes the offsets, applies the inverted matrix and maps back to 8-bit
//! according to a [`RangePolicy`].

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;
use tracing::warn;

use crate::block::Plane;
use crate::consts::{RGB_TO_YCBCR, YCBCR_OFFSETS};
use crate::types::RangePolicy;

#[cfg(feature = "simd")]
use wide::f32x4;

/// Convert one unit-scale RGB sample to YCbCr.
#[inline]
#[must_use]
pub fn rgb_to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let m = &RGB_TO_YCBCR;
    let y = YCBCR_OFFSETS[0] + r * m[0][0] + g * m[0][1] + b * m[0][2];
    let cb = YCBCR_OFFSETS[1] + r * m[1][0] + g * m[1][1] + b * m[1][2];
    let cr = YCBCR_OFFSETS[2] + r * m[2][0] + g * m[2][1] + b * m[2][2];
    (y, cb, cr)
}

/// Inverse of [`RGB_TO_YCBCR`], maps offset-free YCbCr to unit-scale RGB.
#[must_use]
pub fn ycbcr_to_rgb_matrix() -> [[f32; 3]; 3] {
    let m = RGB_TO_YCBCR.map(|row| row.map(f64::from));
    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };

    // Adjugate, transposed into place.
    let adj = [
        [cof(1, 2, 1, 2), -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
        [-cof(1, 2, 0, 2), cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
        [cof(1, 2, 0, 1), -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
    ];
    let det = m[0][0] * adj[0][0] + m[0][1] * adj[1][0] + m[0][2] * adj[2][0];
    adj.map(|row| row.map(|v| (v / det) as f32))
}

/// Convert one YCbCr sample to unit-scale RGB with a precomputed inverse.
#[inline]
#[must_use]
pub fn ycbcr_to_rgb(inv: &[[f32; 3]; 3], y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    let y = y - YCBCR_OFFSETS[0];
    let cb = cb - YCBCR_OFFSETS[1];
    let cr = cr - YCBCR_OFFSETS[2];
    (
        inv[0][0] * y + inv[0][1] * cb + inv[0][2] * cr,
        inv[1][0] * y + inv[1][1] * cb + inv[1][2] * cr,
        inv[2][0] * y + inv[2][1] * cb + inv[2][2] * cr,
    )
}

/// Split an RGB raster into Y, Cb, Cr planes.
pub fn split_planes(raster: ImgRef<'_, RGB8>) -> [Plane; 3] {
    let (width, height) = (raster.width(), raster.height());
    let pixels: Vec<RGB8> = raster.rows().flat_map(|row| row.iter().copied()).collect();

    let mut y_plane = Vec::with_capacity(pixels.len());
    let mut cb_plane = Vec::with_capacity(pixels.len());
    let mut cr_plane = Vec::with_capacity(pixels.len());

    #[cfg(feature = "simd")]
    let rest = {
        let mut chunks = pixels.chunks_exact(4);
        for chunk in &mut chunks {
            let (y, cb, cr) = simd::rgb_to_ycbcr_x4(chunk);
            y_plane.extend_from_slice(&y);
            cb_plane.extend_from_slice(&cb);
            cr_plane.extend_from_slice(&cr);
        }
        chunks.remainder()
    };
    #[cfg(not(feature = "simd"))]
    let rest = &pixels[..];

    for px in rest {
        let (y, cb, cr) = rgb_to_ycbcr(unit(px.r), unit(px.g), unit(px.b));
        y_plane.push(y);
        cb_plane.push(cb);
        cr_plane.push(cr);
    }

    [
        ImgVec::new(y_plane, width, height),
        ImgVec::new(cb_plane, width, height),
        ImgVec::new(cr_plane, width, height),
    ]
}

#[inline]
fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Merge full-resolution Y, Cb, Cr planes back into an 8-bit RGB raster.
pub fn merge_planes(planes: &[Plane; 3], policy: RangePolicy) -> ImgVec<RGB8> {
    let (width, height) = (planes[0].width(), planes[0].height());
    let inv = ycbcr_to_rgb_matrix();

    let rgb: Vec<(f32, f32, f32)> = planes[0]
        .buf()
        .iter()
        .zip(planes[1].buf().iter())
        .zip(planes[2].buf().iter())
        .map(|((&y, &cb), &cr)| ycbcr_to_rgb(&inv, y, cb, cr))
        .collect();

    let to_u8: Box<dyn Fn(f32) -> u8> = match policy {
        RangePolicy::Clamp => Box::new(clamp_to_u8),
        RangePolicy::GlobalStretch => {
            let (min, max) = rgb.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |acc, c| {
                let lo = c.0.min(c.1).min(c.2);
                let hi = c.0.max(c.1).max(c.2);
                (acc.0.min(lo), acc.1.max(hi))
            });
            let range = max - min;
            if range > f32::EPSILON {
                Box::new(move |v| ((v - min) / range * 255.0) as u8)
            } else {
                warn!(min, max, "flat raster cannot be stretched, clamping instead");
                Box::new(clamp_to_u8)
            }
        }
    };

    let pixels = rgb
        .into_iter()
        .map(|(r, g, b)| RGB8::new(to_u8(r), to_u8(g), to_u8(b)))
        .collect();
    ImgVec::new(pixels, width, height)
}

#[inline]
fn clamp_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// SIMD-optimized color conversion
#[cfg(feature = "simd")]
mod simd {
    use super::*;

    /// Convert 4 RGB pixels to YCbCr using SIMD.
    #[inline]
    pub fn rgb_to_ycbcr_x4(px: &[RGB8]) -> ([f32; 4], [f32; 4], [f32; 4]) {
        let scale = f32x4::splat(1.0 / 255.0);
        let rf = f32x4::from([px[0].r as f32, px[1].r as f32, px[2].r as f32, px[3].r as f32]) * scale;
        let gf = f32x4::from([px[0].g as f32, px[1].g as f32, px[2].g as f32, px[3].g as f32]) * scale;
        let bf = f32x4::from([px[0].b as f32, px[1].b as f32, px[2].b as f32, px[3].b as f32]) * scale;

        let row = |c: usize| {
            let m = RGB_TO_YCBCR[c];
            f32x4::splat(YCBCR_OFFSETS[c])
                + rf * f32x4::splat(m[0])
                + gf * f32x4::splat(m[1])
                + bf * f32x4::splat(m[2])
        };

        (row(0).to_array(), row(1).to_array(), row(2).to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(r: u8, g: u8, b: u8, width: usize, height: usize) -> ImgVec<RGB8> {
        ImgVec::new(vec![RGB8::new(r, g, b); width * height], width, height)
    }

    #[test]
    fn test_output_ranges() {
        let (y, cb, cr) = rgb_to_ycbcr(0.0, 0.0, 0.0);
        assert!((y - 16.0).abs() < 1e-4 && (cb - 128.0).abs() < 1e-4 && (cr - 128.0).abs() < 1e-4);

        let (y, cb, cr) = rgb_to_ycbcr(1.0, 1.0, 1.0);
        assert!((y - 235.0).abs() < 1e-3, "Y = {}", y);
        assert!((cb - 128.0).abs() < 1e-3 && (cr - 128.0).abs() < 1e-3);

        let (_, cb, _) = rgb_to_ycbcr(0.0, 0.0, 1.0);
        assert!((cb - 240.0).abs() < 1e-3);
        let (_, _, cr) = rgb_to_ycbcr(1.0, 0.0, 0.0);
        assert!((cr - 240.0).abs() < 1e-3);
    }

    #[test]
    fn test_inverse_matrix() {
        let inv = ycbcr_to_rgb_matrix();
        for i in 0..3 {
            for j in 0..3 {
                let v: f32 = (0..3).map(|k| inv[i][k] * RGB_TO_YCBCR[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-5, "[{}][{}] = {}", i, j, v);
            }
        }
    }

    #[test]
    fn test_rgb_ycbcr_roundtrip() {
        let colors = [
            (0, 0, 0),
            (255, 255, 255),
            (255, 0, 0),
            (0, 255, 0),
            (0, 0, 255),
            (128, 128, 128),
            (200, 100, 50),
        ];

        for (r, g, b) in colors {
            // 5 pixels exercises both the 4-wide and the scalar tail path
            let raster = solid(r, g, b, 5, 1);
            let planes = split_planes(raster.as_ref());
            let back = merge_planes(&planes, RangePolicy::Clamp);
            for px in back.buf() {
                assert_eq!((px.r, px.g, px.b), (r, g, b));
            }
        }
    }

    #[test]
    fn test_scalar_and_vector_paths_agree() {
        let pixels: Vec<RGB8> = (0..8u8)
            .map(|i| RGB8::new(i * 30, 255 - i * 20, i * 7))
            .collect();
        let raster = ImgVec::new(pixels.clone(), 8, 1);
        let planes = split_planes(raster.as_ref());
        for (i, px) in pixels.iter().enumerate() {
            let (y, cb, cr) = rgb_to_ycbcr(unit(px.r), unit(px.g), unit(px.b));
            assert!((planes[0].buf()[i] - y).abs() < 1e-4);
            assert!((planes[1].buf()[i] - cb).abs() < 1e-4);
            assert!((planes[2].buf()[i] - cr).abs() < 1e-4);
        }
    }

    #[test]
    fn test_global_stretch() {
        // Dark gray and mid gray: stretch maps them to 0 and 255
        let mut pixels = vec![RGB8::new(40, 40, 40); 2];
        pixels.push(RGB8::new(120, 120, 120));
        pixels.push(RGB8::new(120, 120, 120));
        let raster = ImgVec::new(pixels, 4, 1);
        let planes = split_planes(raster.as_ref());

        let stretched = merge_planes(&planes, RangePolicy::GlobalStretch);
        assert!(stretched.buf()[0].r <= 1);
        assert!(stretched.buf()[3].g >= 254);

        let clamped = merge_planes(&planes, RangePolicy::Clamp);
        assert_eq!(clamped.buf()[0], RGB8::new(40, 40, 40));
        assert_eq!(clamped.buf()[3], RGB8::new(120, 120, 120));
    }

    #[test]
    fn test_global_stretch_flat_falls_back() {
        let raster = solid(90, 90, 90, 4, 2);
        let planes = split_planes(raster.as_ref());
        let back = merge_planes(&planes, RangePolicy::GlobalStretch);
        assert!(back.buf().iter().all(|px| *px == RGB8::new(90, 90, 90)));
    }
}
