//! Public operator options and error types.

use thiserror::Error;

use crate::tensor::DeviceKind;

use super::constants::{DEFAULT_POOLED_SIZE, DEFAULT_SPATIAL_SCALE};

/// Operator configuration shared by the forward and backward passes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PoolOptions {
    /// Output grid rows per region.
    pub pooled_height: u32,
    /// Output grid columns per region.
    pub pooled_width: u32,
    /// Image-to-feature-map coordinate scale (reciprocal of the feature stride).
    pub spatial_scale: f32,
    /// Sample rows averaged per bin. One samples the bin centre.
    pub samples_y: u32,
    /// Sample columns averaged per bin. One samples the bin centre.
    pub samples_x: u32,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            pooled_height: DEFAULT_POOLED_SIZE,
            pooled_width: DEFAULT_POOLED_SIZE,
            spatial_scale: DEFAULT_SPATIAL_SCALE,
            samples_y: 1,
            samples_x: 1,
        }
    }
}

impl PoolOptions {
    /// Single-centre-sample options for the given grid and scale.
    pub fn new(pooled_height: u32, pooled_width: u32, spatial_scale: f32) -> Self {
        Self {
            pooled_height,
            pooled_width,
            spatial_scale,
            ..Self::default()
        }
    }

    /// Average a `samples_y × samples_x` grid of points per bin.
    pub fn with_samples(mut self, samples_y: u32, samples_x: u32) -> Self {
        self.samples_y = samples_y;
        self.samples_x = samples_x;
        self
    }

    /// Reject configurations the kernels cannot run.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.pooled_height == 0 || self.pooled_width == 0 {
            return Err(PoolError::InvalidConfig("pooled size must be positive"));
        }
        if self.samples_y == 0 || self.samples_x == 0 {
            return Err(PoolError::InvalidConfig("samples per bin must be positive"));
        }
        if !self.spatial_scale.is_finite() || self.spatial_scale <= 0.0 {
            return Err(PoolError::InvalidConfig("spatial scale must be finite and positive"));
        }
        Ok(())
    }
}

/// Broad error category, for callers that branch on the failure class.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend needed for the call was not compiled in.
    Configuration,
    /// The buffers live on a device the operator cannot run on.
    UnsupportedDevice,
    /// Shapes, lengths, indices, or options are inconsistent.
    MalformedInput,
    /// Accelerator kernel launch failed.
    Launch,
}

/// Operator error conditions.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Buffers are resident on a device whose backend feature was not built.
    #[error("not compiled with {0} support")]
    BackendNotCompiled(DeviceKind),
    /// The requested placement has no implementation.
    #[error("{op} is not implemented for buffers on {device}")]
    UnsupportedDevice {
        device: DeviceKind,
        op: &'static str,
    },
    /// Buffer lengths, shapes, or region indices are inconsistent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Options are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Accelerator kernel launch failed.
    #[error("kernel launch failed: {0}")]
    Launch(String),
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::BackendNotCompiled(_) => ErrorKind::Configuration,
            PoolError::UnsupportedDevice { .. } => ErrorKind::UnsupportedDevice,
            PoolError::InvalidInput(_) | PoolError::InvalidConfig(_) => ErrorKind::MalformedInput,
            PoolError::Launch(_) => ErrorKind::Launch,
        }
    }
}
