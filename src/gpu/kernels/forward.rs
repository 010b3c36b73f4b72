//! Forward sampling kernel: one thread per pooled output element.

use cubecl::prelude::*;
use crate::gpu::constants::*;
use super::sampling::*;

/// Pool every `(roi, channel, ph, pw)` element into `output`.
#[cube(launch_unchecked)]
pub(crate) fn pool_points_forward_kernel(
    input: &Array<f32>,
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
    output: &mut Array<f32>,
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
    let mut acc = zero;
    if region_is_degenerate(rois, r) == u32::new(0) {
        let bins = region_bins(rois, r, spatial_scale, pooled_h, pooled_w);
        let batch = rois[(r * ROI_STRIDE) as usize] as u32;
        let plane_base = (batch * channels + c) * height * width;
        for iy in 0..samples_y {
            let y = sample_coord(bins[0], bins[2], ph, iy, samples_y);
            for ix in 0..samples_x {
                let x = sample_coord(bins[1], bins[3], pw, ix, samples_x);
                let taps = bilinear_taps(y, x, height, width);
                if taps[TAP_VALID] > zero {
                    acc += interpolate(input, plane_base, width, taps);
                }
            }
        }
    }

    output[idx] = acc / f32::cast_from(samples_y * samples_x);
}
