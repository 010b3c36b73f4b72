//! Operator defaults and launch constants.

/// Default output grid edge (7×7, the usual detection head size).
pub(crate) const DEFAULT_POOLED_SIZE: u32 = 7;
/// Default image-to-feature scale for a stride-16 backbone.
pub(crate) const DEFAULT_SPATIAL_SCALE: f32 = 1.0 / 16.0;
/// Threads per cube for 1-D accelerator launches.
#[cfg(feature = "gpu")]
pub(crate) const LAUNCH_BLOCK: u32 = 256;
