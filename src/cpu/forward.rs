use rayon::prelude::*;

use crate::geometry::{bilinear_taps, RegionBins};
use crate::pool::utils::pooled_shape;
use crate::pool::PoolOptions;
use crate::tensor::{FeatureMap, PooledOutput, RegionList};

/// Pool every region of `rois` from `input`.
///
/// Each `(roi, channel)` output plane is written by one rayon task; planes are disjoint.
/// Region batch indices must already be validated against `input`.
pub(crate) fn pool_forward(
    input: &FeatureMap,
    rois: &RegionList,
    options: &PoolOptions,
) -> PooledOutput {
    let in_shape = input.shape();
    let out_shape = pooled_shape(rois.len(), in_shape.c, options);
    let mut output = vec![0.0f32; out_shape.numel()];
    let out_plane = out_shape.plane();
    if output.is_empty() || out_plane == 0 {
        return PooledOutput::from_parts(out_shape, output, input.device());
    }

    let in_plane = in_shape.plane();
    let data = input.as_slice();
    output
        .par_chunks_mut(out_plane)
        .enumerate()
        .for_each(|(plane_idx, cells)| {
            let roi = rois.roi(plane_idx / in_shape.c);
            let channel = plane_idx % in_shape.c;
            let Some(bins) = RegionBins::new(
                &roi,
                options.spatial_scale,
                options.pooled_height,
                options.pooled_width,
                options.samples_y,
                options.samples_x,
            ) else {
                return;
            };
            let base = in_shape.offset(roi.batch() as usize, channel, 0, 0);
            let plane = &data[base..base + in_plane];
            pool_plane(&bins, plane, in_shape.h, in_shape.w, options, cells);
        });

    PooledOutput::from_parts(out_shape, output, input.device())
}

fn pool_plane(
    bins: &RegionBins,
    plane: &[f32],
    height: usize,
    width: usize,
    options: &PoolOptions,
    cells: &mut [f32],
) {
    let count = bins.sample_count() as f32;
    for ph in 0..options.pooled_height {
        for pw in 0..options.pooled_width {
            let mut acc = 0.0f32;
            for iy in 0..bins.samples_y {
                for ix in 0..bins.samples_x {
                    let (y, x) = bins.sample_point(ph, pw, iy, ix);
                    if let Some(taps) = bilinear_taps(y, x, height, width) {
                        acc += taps.interpolate(plane, width);
                    }
                }
            }
            cells[(ph * options.pooled_width + pw) as usize] = acc / count;
        }
    }
}
