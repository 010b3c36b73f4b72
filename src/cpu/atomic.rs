//! Lock-free `f32` accumulation over a shape-indexed buffer.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::tensor::{Device, Shape4, Tensor4};

/// Zero-initialised `f32` buffer supporting concurrent `fetch_add`.
///
/// Values are stored as their IEEE-754 bit patterns and updated with a compare-and-swap loop,
/// so no contribution is lost when several workers hit the same cell.
pub(crate) struct AtomicGradBuffer {
    shape: Shape4,
    cells: Vec<AtomicU32>,
}

impl AtomicGradBuffer {
    pub(crate) fn zeros(shape: Shape4) -> Self {
        let zero = 0.0f32.to_bits();
        let cells = (0..shape.numel()).map(|_| AtomicU32::new(zero)).collect();
        Self { shape, cells }
    }

    pub(crate) fn shape(&self) -> Shape4 {
        self.shape
    }

    /// Atomically add `value` at flat `offset`.
    #[inline]
    pub(crate) fn fetch_add(&self, offset: usize, value: f32) {
        let cell = &self.cells[offset];
        // fetch_update retries until no other writer raced us; the closure never declines.
        let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + value).to_bits())
        });
    }

    pub(crate) fn into_tensor(self, device: Device) -> Tensor4 {
        let data = self
            .cells
            .into_iter()
            .map(|cell| f32::from_bits(cell.into_inner()))
            .collect();
        Tensor4::from_parts(self.shape, data, device)
    }
}
