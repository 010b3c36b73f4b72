//! Region mapping and bilinear taps shared by the forward and backward kernels.

use cubecl::prelude::*;
use crate::gpu::constants::*;
use super::math::max_f32;

/// Returns 1 when the region row has zero or negative extent.
#[cube]
pub(super) fn region_is_degenerate(rois: &Array<f32>, roi_index: u32) -> u32 {
    let base = (roi_index * ROI_STRIDE) as usize;
    let mut out = u32::new(0);
    if rois[base + 3] <= rois[base + 1] || rois[base + 4] <= rois[base + 2] {
        out = u32::new(1);
    }
    out
}

/// Map a region row into feature space as `[start_y, start_x, bin_h, bin_w]`.
#[cube]
pub(super) fn region_bins(
    rois: &Array<f32>,
    roi_index: u32,
    spatial_scale: f32,
    pooled_h: u32,
    pooled_w: u32,
) -> Line<f32> {
    let base = (roi_index * ROI_STRIDE) as usize;
    let one = f32::new(1.0);
    let start_x = rois[base + 1] * spatial_scale;
    let start_y = rois[base + 2] * spatial_scale;
    let end_x = rois[base + 3] * spatial_scale;
    let end_y = rois[base + 4] * spatial_scale;
    let roi_w = max_f32(end_x - start_x, one);
    let roi_h = max_f32(end_y - start_y, one);

    let mut out = Line::empty(REGION_LINE_SIZE);
    out[0] = start_y;
    out[1] = start_x;
    out[2] = roi_h / f32::cast_from(pooled_h);
    out[3] = roi_w / f32::cast_from(pooled_w);
    out
}

/// Coordinate of sample `sample` (of `samples`) inside bin `cell`.
#[cube]
pub(super) fn sample_coord(start: f32, bin: f32, cell: u32, sample: u32, samples: u32) -> f32 {
    let frac = (f32::cast_from(sample) + f32::new(0.5)) / f32::cast_from(samples);
    start + (f32::cast_from(cell) + frac) * bin
}

/// Bilinear taps of `(y, x)` packed as a tap line (see `TAP_*` slots).
#[cube]
pub(super) fn bilinear_taps(y: f32, x: f32, height: u32, width: u32) -> Line<f32> {
    let zero = f32::new(0.0);
    let one = f32::new(1.0);
    let mut out = Line::empty(TAP_LINE_SIZE);
    out[TAP_VALID] = zero;
    out[TAP_Y_LOW] = zero;
    out[TAP_Y_HIGH] = zero;
    out[TAP_X_LOW] = zero;
    out[TAP_X_HIGH] = zero;
    out[TAP_LY] = zero;
    out[TAP_LX] = zero;
    out[TAP_PAD] = zero;

    let neg_one = f32::new(-1.0);
    let h = f32::cast_from(height);
    let w = f32::cast_from(width);
    if height > u32::new(0) && width > u32::new(0) && y >= neg_one && y <= h && x >= neg_one && x <= w {
        let last_y = f32::cast_from(height - u32::new(1));
        let last_x = f32::cast_from(width - u32::new(1));

        let mut yv = max_f32(y, zero);
        let mut y_low = yv.floor();
        let mut y_high = y_low + one;
        if y_low >= last_y {
            y_low = last_y;
            y_high = last_y;
            yv = last_y;
        }

        let mut xv = max_f32(x, zero);
        let mut x_low = xv.floor();
        let mut x_high = x_low + one;
        if x_low >= last_x {
            x_low = last_x;
            x_high = last_x;
            xv = last_x;
        }

        out[TAP_VALID] = one;
        out[TAP_Y_LOW] = y_low;
        out[TAP_Y_HIGH] = y_high;
        out[TAP_X_LOW] = x_low;
        out[TAP_X_HIGH] = x_high;
        out[TAP_LY] = yv - y_low;
        out[TAP_LX] = xv - x_low;
    }
    out
}

/// Interpolate one `(height, width)` plane starting at `plane_base`.
#[cube]
pub(super) fn interpolate(input: &Array<f32>, plane_base: u32, width: u32, taps: Line<f32>) -> f32 {
    let one = f32::new(1.0);
    let ly = taps[TAP_LY];
    let lx = taps[TAP_LX];
    let hy = one - ly;
    let hx = one - lx;
    let row_low = plane_base + (taps[TAP_Y_LOW] as u32) * width;
    let row_high = plane_base + (taps[TAP_Y_HIGH] as u32) * width;
    let x_low = taps[TAP_X_LOW] as u32;
    let x_high = taps[TAP_X_HIGH] as u32;

    hy * hx * input[(row_low + x_low) as usize]
        + hy * lx * input[(row_low + x_high) as usize]
        + ly * hx * input[(row_high + x_low) as usize]
        + ly * lx * input[(row_high + x_high) as usize]
}
