//! GPU kernel entrypoints.

pub(crate) use super::backward::pool_points_backward_kernel;
pub(crate) use super::forward::pool_points_forward_kernel;
