//! Backward scatter kernel: one thread per upstream gradient element.

use cubecl::prelude::*;
use crate::gpu::constants::*;
use super::sampling::*;

/// Atomically add `g` times each bilinear weight into the four taps.
#[cube]
pub(super) fn atomic_add_taps(
    grad_input: &mut Array<Atomic<f32>>,
    plane_base: u32,
    width: u32,
    taps: Line<f32>,
    g: f32,
) {
    let one = f32::new(1.0);
    let ly = taps[TAP_LY];
    let lx = taps[TAP_LX];
    let hy = one - ly;
    let hx = one - lx;
    let row_low = plane_base + (taps[TAP_Y_LOW] as u32) * width;
    let row_high = plane_base + (taps[TAP_Y_HIGH] as u32) * width;
    let x_low = taps[TAP_X_LOW] as u32;
    let x_high = taps[TAP_X_HIGH] as u32;

    grad_input[(row_low + x_low) as usize].fetch_add(g * (hy * hx));
    grad_input[(row_low + x_high) as usize].fetch_add(g * (hy * lx));
    grad_input[(row_high + x_low) as usize].fetch_add(g * (ly * hx));
    grad_input[(row_high + x_high) as usize].fetch_add(g * (ly * lx));
}

/// Scatter every `(roi, channel, ph, pw)` upstream gradient into `grad_input`.
#[cube(launch_unchecked)]
pub(crate) fn pool_points_backward_kernel(
    grad: &Array<f32>,
    rois: &Array<f32>,
    channels: u32,
    height: u32,
    width: u32,
    pooled_h: u32,
    pooled_w: u32,
    samples_y: u32,
    samples_x: u32,
    spatial_scale: f32,
    total: u32,
    grad_input: &mut Array<Atomic<f32>>,
) {
    let idx = ABSOLUTE_POS;
    if idx >= total as usize {
        terminate!();
    }

    let idx_u32 = idx as u32;
    let pw = idx_u32 % pooled_w;
    let ph = (idx_u32 / pooled_w) % pooled_h;
    let c = (idx_u32 / (pooled_w * pooled_h)) % channels;
    let r = idx_u32 / (pooled_w * pooled_h * channels);

    let zero = f32::new(0.0);
    let g = grad[idx] / f32::cast_from(samples_y * samples_x);
    if g != zero && region_is_degenerate(rois, r) == u32::new(0) {
        let bins = region_bins(rois, r, spatial_scale, pooled_h, pooled_w);
        let batch = rois[(r * ROI_STRIDE) as usize] as u32;
        let plane_base = (batch * channels + c) * height * width;
        for iy in 0..samples_y {
            let y = sample_coord(bins[0], bins[2], ph, iy, samples_y);
            for ix in 0..samples_x {
                let x = sample_coord(bins[1], bins[3], pw, ix, samples_x);
                let taps = bilinear_taps(y, x, height, width);
                if taps[TAP_VALID] > zero {
                    atomic_add_taps(grad_input, plane_base, width, taps, g);
                }
            }
        }
    }
}
