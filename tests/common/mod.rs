//! Common test utilities for blockcodec tests.
//!
//! Synthetic rasters and error measures; no external test data is needed.

#![allow(dead_code)]

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;

/// Horizontal/vertical/diagonal gradient in R, G, B.
pub fn gradient(width: usize, height: usize) -> ImgVec<RGB8> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            pixels.push(RGB8::new(
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 255 / (width + height)) as u8,
            ));
        }
    }
    ImgVec::new(pixels, width, height)
}

/// Single solid color.
pub fn uniform(width: usize, height: usize, r: u8, g: u8, b: u8) -> ImgVec<RGB8> {
    ImgVec::new(vec![RGB8::new(r, g, b); width * height], width, height)
}

/// Gray texture that repeats every 8 pixels, so every 8x8 block is identical.
pub fn tiled_texture(width: usize, height: usize) -> ImgVec<RGB8> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let v = (((x % 8) * 37 + (y % 8) * 91) * 53 % 256) as u8;
            pixels.push(RGB8::new(v, v, v));
        }
    }
    ImgVec::new(pixels, width, height)
}

/// Color texture with detail at several scales.
pub fn busy(width: usize, height: usize) -> ImgVec<RGB8> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let checker = if (x / 2 + y / 2) % 2 == 0 { 60 } else { 0 };
            pixels.push(RGB8::new(
                (x * 3 % 160) as u8 + checker,
                (y * 5 % 160) as u8 + checker,
                ((x * y) % 120) as u8 + checker,
            ));
        }
    }
    ImgVec::new(pixels, width, height)
}

/// Packed RGB bytes of a raster.
pub fn to_bytes(img: ImgRef<'_, RGB8>) -> Vec<u8> {
    img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect()
}

/// Mean absolute per-channel difference.
pub fn mean_abs_error(a: ImgRef<'_, RGB8>, b: ImgRef<'_, RGB8>) -> f64 {
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    let mut sum = 0u64;
    for (p, q) in a.pixels().zip(b.pixels()) {
        sum += (p.r as i32 - q.r as i32).unsigned_abs() as u64;
        sum += (p.g as i32 - q.g as i32).unsigned_abs() as u64;
        sum += (p.b as i32 - q.b as i32).unsigned_abs() as u64;
    }
    sum as f64 / (a.width() * a.height() * 3) as f64
}

/// Largest per-channel difference.
pub fn max_abs_error(a: ImgRef<'_, RGB8>, b: ImgRef<'_, RGB8>) -> u8 {
    a.pixels()
        .zip(b.pixels())
        .map(|(p, q)| {
            p.r.abs_diff(q.r).max(p.g.abs_diff(q.g)).max(p.b.abs_diff(q.b))
        })
        .max()
        .unwrap_or(0)
}
