//! CubeCL kernels for point pooling.

mod backward;
mod entrypoints;
mod forward;
mod math;
mod sampling;

pub(crate) use entrypoints::*;
