//! Host-side uploads, launches, and readback for the accelerator backend.

use cubecl::features::TypeUsage;
use cubecl::ir::{ElemType, FloatKind, StorageType};
use cubecl::prelude::*;
use tracing::trace;

use crate::gpu;
use crate::pool::constants::LAUNCH_BLOCK;
use crate::pool::utils::{div_ceil, ensure_nonempty, pooled_shape};
use crate::pool::{PoolError, PoolOptions};
use crate::tensor::{FeatureMap, FeatureMapGradient, PooledOutput, RegionList, Shape4};

/// Whether the runtime on `device` supports `f32` atomic add.
pub(crate) fn supports_float_atomics<R: Runtime>(device: &R::Device) -> bool {
    let client = R::client(device);
    client
        .properties()
        .type_usage(StorageType::Atomic(ElemType::Float(FloatKind::F32)))
        .contains(TypeUsage::AtomicAdd)
}

/// Element counts index `u32` buffers on the device.
fn launch_extent(len: usize, what: &str) -> Result<u32, PoolError> {
    u32::try_from(len)
        .map_err(|_| PoolError::InvalidInput(format!("{what} has {len} elements, too many for a 1d launch")))
}

pub(crate) fn forward_on<R: Runtime>(
    device: &R::Device,
    input: &FeatureMap,
    rois: &RegionList,
    options: &PoolOptions,
) -> Result<PooledOutput, PoolError> {
    let in_shape = input.shape();
    let out_shape = pooled_shape(rois.len(), in_shape.c, options);
    let total = launch_extent(out_shape.numel(), "pooled output")?;
    launch_extent(in_shape.numel(), "feature map")?;
    if total == 0 {
        return Ok(PooledOutput::zeros(out_shape, input.device()));
    }

    let client = R::client(device);
    let input_data = ensure_nonempty(input.as_slice(), 0.0);
    let output_init = vec![0.0f32; total as usize];

    let input_handle = client.create_from_slice(f32::as_bytes(&input_data));
    let roi_handle = client.create_from_slice(f32::as_bytes(rois.as_slice()));
    let output_handle = client.create_from_slice(f32::as_bytes(&output_init));

    let cube_dim = CubeDim::new_1d(LAUNCH_BLOCK);
    let cube_count = CubeCount::new_1d(div_ceil(total, cube_dim.x));
    trace!(total, shape = %out_shape, "launching forward kernel");
    unsafe {
        gpu::pool_points_forward_kernel::launch_unchecked::<R>(
            &client,
            cube_count,
            cube_dim,
            ArrayArg::from_raw_parts::<f32>(&input_handle, input_data.len(), 1),
            ArrayArg::from_raw_parts::<f32>(&roi_handle, rois.as_slice().len(), 1),
            ScalarArg::new(in_shape.c as u32),
            ScalarArg::new(in_shape.h as u32),
            ScalarArg::new(in_shape.w as u32),
            ScalarArg::new(options.pooled_height),
            ScalarArg::new(options.pooled_width),
            ScalarArg::new(options.samples_y),
            ScalarArg::new(options.samples_x),
            ScalarArg::new(options.spatial_scale),
            ScalarArg::new(total),
            ArrayArg::from_raw_parts::<f32>(&output_handle, output_init.len(), 1),
        )
        .map_err(|err| PoolError::Launch(format!("{err:?}")))?;
    }

    let output = f32::from_bytes(&client.read_one(output_handle)).to_vec();
    Ok(PooledOutput::from_parts(out_shape, output, input.device()))
}

/// Requires float atomics; callers check [`supports_float_atomics`] first.
pub(crate) fn backward_on<R: Runtime>(
    device: &R::Device,
    grad: &PooledOutput,
    rois: &RegionList,
    options: &PoolOptions,
    input_shape: Shape4,
) -> Result<FeatureMapGradient, PoolError> {
    let total = launch_extent(grad.shape().numel(), "upstream gradient")?;
    let input_len = launch_extent(input_shape.numel(), "feature map gradient")?;
    if total == 0 || input_len == 0 {
        return Ok(FeatureMapGradient::zeros(input_shape, grad.device()));
    }

    let client = R::client(device);
    let grad_input_init = vec![0.0f32; input_len as usize];

    let grad_handle = client.create_from_slice(f32::as_bytes(grad.as_slice()));
    let roi_handle = client.create_from_slice(f32::as_bytes(rois.as_slice()));
    let grad_input_handle = client.create_from_slice(f32::as_bytes(&grad_input_init));

    let cube_dim = CubeDim::new_1d(LAUNCH_BLOCK);
    let cube_count = CubeCount::new_1d(div_ceil(total, cube_dim.x));
    trace!(total, shape = %input_shape, "launching backward kernel");
    unsafe {
        gpu::pool_points_backward_kernel::launch_unchecked::<R>(
            &client,
            cube_count,
            cube_dim,
            ArrayArg::from_raw_parts::<f32>(&grad_handle, grad.as_slice().len(), 1),
            ArrayArg::from_raw_parts::<f32>(&roi_handle, rois.as_slice().len(), 1),
            ScalarArg::new(input_shape.c as u32),
            ScalarArg::new(input_shape.h as u32),
            ScalarArg::new(input_shape.w as u32),
            ScalarArg::new(options.pooled_height),
            ScalarArg::new(options.pooled_width),
            ScalarArg::new(options.samples_y),
            ScalarArg::new(options.samples_x),
            ScalarArg::new(options.spatial_scale),
            ScalarArg::new(total),
            ArrayArg::from_raw_parts::<f32>(&grad_input_handle, grad_input_init.len(), 1),
        )
        .map_err(|err| PoolError::Launch(format!("{err:?}")))?;
    }

    let grad_input = f32::from_bytes(&client.read_one(grad_input_handle)).to_vec();
    Ok(FeatureMapGradient::from_parts(input_shape, grad_input, grad.device()))
}
