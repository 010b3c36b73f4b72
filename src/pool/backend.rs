//! Execution backend resolution and capability reporting.

use tracing::warn;

use crate::cpu;
use crate::tensor::{Device, DeviceKind, FeatureMap, FeatureMapGradient, PooledOutput, RegionList, Shape4};

use super::types::{PoolError, PoolOptions};

/// What an execution backend can do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Native `f32` atomic add over a shape-indexed buffer.
    pub atomic_add_f32: bool,
    /// Runs on a device separate from host memory.
    pub accelerator: bool,
}

/// Backend chosen once per call from the device the primary buffer lives on.
pub(crate) enum Backend {
    Cpu,
    #[cfg(feature = "wgpu")]
    Wgpu(cubecl::wgpu::WgpuDevice),
    #[cfg(feature = "cuda")]
    Cuda(cubecl::cuda::CudaDevice),
}

impl Backend {
    pub(crate) fn resolve(device: Device) -> Result<Self, PoolError> {
        match device {
            Device::Cpu => Ok(Backend::Cpu),
            Device::Wgpu => wgpu_backend(),
            Device::Cuda { index } => cuda_backend(index),
        }
    }

    pub(crate) fn kind(&self) -> DeviceKind {
        match self {
            Backend::Cpu => DeviceKind::Cpu,
            #[cfg(feature = "wgpu")]
            Backend::Wgpu(_) => DeviceKind::Wgpu,
            #[cfg(feature = "cuda")]
            Backend::Cuda(_) => DeviceKind::Cuda,
        }
    }

    pub(crate) fn capabilities(&self) -> BackendCapabilities {
        match self {
            Backend::Cpu => BackendCapabilities {
                atomic_add_f32: true,
                accelerator: false,
            },
            #[cfg(feature = "wgpu")]
            Backend::Wgpu(device) => BackendCapabilities {
                atomic_add_f32: crate::gpu::supports_float_atomics::<cubecl::wgpu::WgpuRuntime>(device),
                accelerator: true,
            },
            #[cfg(feature = "cuda")]
            Backend::Cuda(device) => BackendCapabilities {
                atomic_add_f32: crate::gpu::supports_float_atomics::<cubecl::cuda::CudaRuntime>(device),
                accelerator: true,
            },
        }
    }

    pub(crate) fn forward(
        &self,
        input: &FeatureMap,
        rois: &RegionList,
        options: &PoolOptions,
    ) -> Result<PooledOutput, PoolError> {
        match self {
            Backend::Cpu => Ok(cpu::pool_forward(input, rois, options)),
            #[cfg(feature = "wgpu")]
            Backend::Wgpu(device) => {
                crate::gpu::forward_on::<cubecl::wgpu::WgpuRuntime>(device, input, rois, options)
            }
            #[cfg(feature = "cuda")]
            Backend::Cuda(device) => {
                crate::gpu::forward_on::<cubecl::cuda::CudaRuntime>(device, input, rois, options)
            }
        }
    }

    pub(crate) fn backward(
        &self,
        grad: &PooledOutput,
        rois: &RegionList,
        options: &PoolOptions,
        input_shape: Shape4,
    ) -> Result<FeatureMapGradient, PoolError> {
        if !self.capabilities().atomic_add_f32 {
            warn!(backend = %self.kind(), "no f32 atomic add support, scattering gradients on the CPU");
            return Ok(cpu::pool_backward(grad, rois, options, input_shape));
        }
        match self {
            Backend::Cpu => Ok(cpu::pool_backward(grad, rois, options, input_shape)),
            #[cfg(feature = "wgpu")]
            Backend::Wgpu(device) => crate::gpu::backward_on::<cubecl::wgpu::WgpuRuntime>(
                device,
                grad,
                rois,
                options,
                input_shape,
            ),
            #[cfg(feature = "cuda")]
            Backend::Cuda(device) => crate::gpu::backward_on::<cubecl::cuda::CudaRuntime>(
                device,
                grad,
                rois,
                options,
                input_shape,
            ),
        }
    }
}

#[cfg(feature = "wgpu")]
fn wgpu_backend() -> Result<Backend, PoolError> {
    Ok(Backend::Wgpu(cubecl::wgpu::WgpuDevice::default()))
}

#[cfg(not(feature = "wgpu"))]
fn wgpu_backend() -> Result<Backend, PoolError> {
    Err(PoolError::BackendNotCompiled(DeviceKind::Wgpu))
}

#[cfg(feature = "cuda")]
fn cuda_backend(index: usize) -> Result<Backend, PoolError> {
    Ok(Backend::Cuda(cubecl::cuda::CudaDevice::new(index)))
}

#[cfg(not(feature = "cuda"))]
fn cuda_backend(_index: usize) -> Result<Backend, PoolError> {
    Err(PoolError::BackendNotCompiled(DeviceKind::Cuda))
}
