//! Bilinear point pooling over regions of interest.
//!
//! [`forward`] samples a fixed `pooled_height × pooled_width` grid per region from an
//! `(N, C, H, W)` feature map; [`backward`] scatters upstream gradients back onto the map.
//! Both run on the CPU (rayon) or, with the `wgpu`/`cuda` features, on a CubeCL accelerator
//! chosen from the device the buffers are resident on.

mod cpu;
mod geometry;
#[cfg(feature = "gpu")]
mod gpu;
mod pool;
mod tensor;

pub use geometry::{bilinear_taps, BilinearTaps};
pub use pool::{
    backend_capabilities, backward, forward, BackendCapabilities, ErrorKind, PointPool, PoolError,
    PoolOptions,
};
pub use tensor::{
    Device, DeviceKind, FeatureMap, FeatureMapGradient, PooledOutput, RegionList, Roi, Shape4,
    Tensor4, ROI_STRIDE,
};
