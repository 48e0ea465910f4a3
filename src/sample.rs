//! Chroma subsampling and upsampling.
//!
//! Downsampling is plain strided decimation: every `h`-th column of every
//! `v`-th row is kept, with no filtering. Upsampling is bilinear
//! interpolation back to the full plane size, sampling at pixel centers and
//! clamping at the edges. The pair is deliberately lossy.

use imgref::ImgVec;

use crate::block::Plane;

/// Keep every `h_ratio`-th column and `v_ratio`-th row.
///
/// Output dimensions are rounded up so every input row/column group is
/// represented.
pub fn downsample(plane: &Plane, h_ratio: usize, v_ratio: usize) -> Plane {
    assert!(h_ratio >= 1 && v_ratio >= 1, "ratios must be at least 1");
    if h_ratio == 1 && v_ratio == 1 {
        return plane.clone();
    }

    let output_width = (plane.width() + h_ratio - 1) / h_ratio;
    let output_height = (plane.height() + v_ratio - 1) / v_ratio;

    let mut out = Vec::with_capacity(output_width * output_height);
    for row in plane.rows().step_by(v_ratio) {
        out.extend(row.iter().step_by(h_ratio).copied());
    }
    ImgVec::new(out, output_width, output_height)
}

/// Bilinear resize of a plane to `width × height`.
pub fn upsample(plane: &Plane, width: usize, height: usize) -> Plane {
    let (in_w, in_h) = (plane.width(), plane.height());
    if in_w == width && in_h == height {
        return plane.clone();
    }

    let xs = axis_taps(in_w, width);
    let ys = axis_taps(in_h, height);
    let src = plane.buf();

    let mut out = Vec::with_capacity(width * height);
    for &(y0, y1, fy) in &ys {
        let row0 = &src[y0 * in_w..(y0 + 1) * in_w];
        let row1 = &src[y1 * in_w..(y1 + 1) * in_w];
        for &(x0, x1, fx) in &xs {
            let top = row0[x0] + (row0[x1] - row0[x0]) * fx;
            let bottom = row1[x0] + (row1[x1] - row1[x0]) * fx;
            out.push(top + (bottom - top) * fy);
        }
    }
    ImgVec::new(out, width, height)
}

/// Source neighbours and blend weight for every output coordinate on one axis.
fn axis_taps(input_len: usize, output_len: usize) -> Vec<(usize, usize, f32)> {
    let scale = input_len as f32 / output_len as f32;
    let last = input_len.saturating_sub(1);
    (0..output_len)
        .map(|o| {
            let pos = ((o as f32 + 0.5) * scale - 0.5).clamp(0.0, last as f32);
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(last);
            (i0, i1, pos - i0 as f32)
        })
        .collect()
}
