//! Entry points: validate placement and inputs, resolve the backend, run the pass.

use core::fmt;

use tracing::debug;

use crate::tensor::{Device, FeatureMap, FeatureMapGradient, PooledOutput, RegionList, Shape4};

use super::backend::{Backend, BackendCapabilities};
use super::types::{PoolError, PoolOptions};
use super::utils::{validate_grad_shape, validate_regions};

/// Regions must live on the same device kind as the primary buffer.
fn check_placement(primary: Device, rois: &RegionList, op: &'static str) -> Result<(), PoolError> {
    if rois.device().kind() != primary.kind() {
        return Err(PoolError::UnsupportedDevice {
            device: rois.device().kind(),
            op,
        });
    }
    Ok(())
}

/// Sample a `pooled_height × pooled_width` grid per region from `input`.
///
/// Output shape is `(rois.len(), input.channels, pooled_height, pooled_width)`, resident on
/// `input`'s device.
pub fn forward(
    input: &FeatureMap,
    rois: &RegionList,
    options: &PoolOptions,
) -> Result<PooledOutput, PoolError> {
    options.validate()?;
    let backend = Backend::resolve(input.device())?;
    check_placement(input.device(), rois, "forward")?;
    validate_regions(rois, input.shape().n)?;
    debug!(
        backend = %backend.kind(),
        rois = rois.len(),
        input = %input.shape(),
        "pool points forward"
    );
    backend.forward(input, rois, options)
}

/// Scatter `grad` back onto a zeroed `(batch_size, channels, height, width)` gradient.
///
/// The input shape cannot be recovered from `grad`, so it is passed explicitly.
pub fn backward(
    grad: &PooledOutput,
    rois: &RegionList,
    options: &PoolOptions,
    batch_size: usize,
    channels: usize,
    height: usize,
    width: usize,
) -> Result<FeatureMapGradient, PoolError> {
    options.validate()?;
    let backend = Backend::resolve(grad.device())?;
    check_placement(grad.device(), rois, "backward")?;
    validate_grad_shape(grad.shape(), rois.len(), channels, options)?;
    validate_regions(rois, batch_size)?;
    let input_shape = Shape4::new(batch_size, channels, height, width);
    input_shape.checked_numel().ok_or_else(|| {
        PoolError::InvalidInput(format!("input shape {input_shape} overflows usize"))
    })?;
    debug!(
        backend = %backend.kind(),
        rois = rois.len(),
        input = %input_shape,
        "pool points backward"
    );
    backend.backward(grad, rois, options, input_shape)
}

/// Capabilities of the backend that would serve buffers on `device`.
pub fn backend_capabilities(device: Device) -> Result<BackendCapabilities, PoolError> {
    Ok(Backend::resolve(device)?.capabilities())
}

/// Point pooling operator with fixed output size and spatial scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointPool {
    options: PoolOptions,
}

impl PointPool {
    pub fn new(options: PoolOptions) -> Result<Self, PoolError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    pub fn forward(&self, input: &FeatureMap, rois: &RegionList) -> Result<PooledOutput, PoolError> {
        forward(input, rois, &self.options)
    }

    /// Backward pass for an input of `input_shape`.
    pub fn backward(
        &self,
        grad: &PooledOutput,
        rois: &RegionList,
        input_shape: Shape4,
    ) -> Result<FeatureMapGradient, PoolError> {
        backward(
            grad,
            rois,
            &self.options,
            input_shape.n,
            input_shape.c,
            input_shape.h,
            input_shape.w,
        )
    }
}

impl fmt::Display for PointPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PointPool(output_size=({}, {}), spatial_scale={})",
            self.options.pooled_height, self.options.pooled_width, self.options.spatial_scale
        )
    }
}
