//! Boundary checks and buffer helpers shared by the CPU and accelerator paths.

#[cfg(feature = "gpu")]
use std::borrow::Cow;

use crate::tensor::{RegionList, Shape4};

use super::types::{PoolError, PoolOptions};

/// Check every region has finite fields and addresses a valid batch entry.
pub(crate) fn validate_regions(rois: &RegionList, batch: usize) -> Result<(), PoolError> {
    for (idx, roi) in rois.iter().enumerate() {
        if !roi.batch_index.is_finite() {
            return Err(PoolError::InvalidInput(format!(
                "region {idx} has non-finite batch index"
            )));
        }
        if ![roi.x1, roi.y1, roi.x2, roi.y2].iter().all(|v| v.is_finite()) {
            return Err(PoolError::InvalidInput(format!(
                "region {idx} has non-finite coordinates"
            )));
        }
        let b = roi.batch();
        if b < 0 || b as u64 >= batch as u64 {
            return Err(PoolError::InvalidInput(format!(
                "region {idx} has batch index {b}, batch size is {batch}"
            )));
        }
    }
    Ok(())
}

/// Shape of the pooled output for `num_rois` regions.
pub(crate) fn pooled_shape(num_rois: usize, channels: usize, options: &PoolOptions) -> Shape4 {
    Shape4::new(
        num_rois,
        channels,
        options.pooled_height as usize,
        options.pooled_width as usize,
    )
}

/// Check an upstream gradient matches the forward output layout.
pub(crate) fn validate_grad_shape(
    grad: Shape4,
    num_rois: usize,
    channels: usize,
    options: &PoolOptions,
) -> Result<(), PoolError> {
    let expected = pooled_shape(num_rois, channels, options);
    if grad != expected {
        return Err(PoolError::InvalidInput(format!(
            "upstream gradient shape {grad} does not match pooled shape {expected}"
        )));
    }
    Ok(())
}

/// Pad an empty buffer to one element; WGPU cannot bind empty buffers.
#[cfg(feature = "gpu")]
pub(crate) fn ensure_nonempty(data: &[f32], filler: f32) -> Cow<'_, [f32]> {
    if data.is_empty() {
        Cow::Owned(vec![filler])
    } else {
        Cow::Borrowed(data)
    }
}

#[cfg(feature = "gpu")]
pub(crate) fn div_ceil(value: u32, divisor: u32) -> u32 {
    if divisor == 0 {
        return 0;
    }
    value.div_ceil(divisor)
}
