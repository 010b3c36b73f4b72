use rayon::prelude::*;

use crate::geometry::{bilinear_taps, RegionBins};
use crate::pool::PoolOptions;
use crate::tensor::{FeatureMapGradient, PooledOutput, RegionList, Shape4};

use super::atomic::AtomicGradBuffer;

/// Scatter `grad` back onto a zeroed `input_shape` gradient.
///
/// Work is split per `(roi, channel)` plane. Planes of different regions can target the same
/// input cells, so every write goes through [`AtomicGradBuffer::fetch_add`].
pub(crate) fn pool_backward(
    grad: &PooledOutput,
    rois: &RegionList,
    options: &PoolOptions,
    input_shape: Shape4,
) -> FeatureMapGradient {
    let accum = AtomicGradBuffer::zeros(input_shape);
    let grad_plane = grad.shape().plane();
    if grad_plane == 0 || input_shape.numel() == 0 || grad.as_slice().is_empty() {
        return accum.into_tensor(grad.device());
    }

    let channels = input_shape.c;
    grad.as_slice()
        .par_chunks(grad_plane)
        .enumerate()
        .for_each(|(plane_idx, cells)| {
            let roi = rois.roi(plane_idx / channels);
            let channel = plane_idx % channels;
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
            scatter_plane(&bins, cells, roi.batch() as usize, channel, options, &accum);
        });

    accum.into_tensor(grad.device())
}

fn scatter_plane(
    bins: &RegionBins,
    cells: &[f32],
    batch: usize,
    channel: usize,
    options: &PoolOptions,
    accum: &AtomicGradBuffer,
) {
    let shape = accum.shape();
    let count = bins.sample_count() as f32;
    for ph in 0..options.pooled_height {
        for pw in 0..options.pooled_width {
            let g = cells[(ph * options.pooled_width + pw) as usize] / count;
            if g == 0.0 {
                continue;
            }
            for iy in 0..bins.samples_y {
                for ix in 0..bins.samples_x {
                    let (y, x) = bins.sample_point(ph, pw, iy, ix);
                    let Some(taps) = bilinear_taps(y, x, shape.h, shape.w) else {
                        continue;
                    };
                    for ((ty, tx), weight) in taps.positions().into_iter().zip(taps.weights) {
                        accum.fetch_add(shape.offset(batch, channel, ty, tx), g * weight);
                    }
                }
            }
        }
    }
}
