//! GPU data layout and kernel constants.

/// Float stride for packed region rows (`rois`).
pub(crate) const ROI_STRIDE: u32 = 5;

/// Line width returned by the bilinear tap helper.
pub(crate) const TAP_LINE_SIZE: usize = 8;
/// Tap line slot: 1.0 when the sample hits the grid, else 0.0.
pub(crate) const TAP_VALID: usize = 0;
/// Tap line slot: lower row index.
pub(crate) const TAP_Y_LOW: usize = 1;
/// Tap line slot: upper row index.
pub(crate) const TAP_Y_HIGH: usize = 2;
/// Tap line slot: lower column index.
pub(crate) const TAP_X_LOW: usize = 3;
/// Tap line slot: upper column index.
pub(crate) const TAP_X_HIGH: usize = 4;
/// Tap line slot: fractional row offset `ly`.
pub(crate) const TAP_LY: usize = 5;
/// Tap line slot: fractional column offset `lx`.
pub(crate) const TAP_LX: usize = 6;
/// Tap line slot: unused padding up to `TAP_LINE_SIZE`.
pub(crate) const TAP_PAD: usize = 7;

/// Line width returned by the region mapping helper.
pub(crate) const REGION_LINE_SIZE: usize = 4;
