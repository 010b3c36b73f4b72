//! Region-to-sample coordinate mapping and bilinear taps shared by the CPU forward and backward passes.
//!
//! Both passes go through [`RegionBins::sample_point`] and [`bilinear_taps`] so the sample
//! positions and weights are bit-identical between them.

use crate::tensor::Roi;

/// Minimum region extent in feature-map cells.
const MIN_EXTENT: f32 = 1.0;

/// Per-region bin layout in feature-map coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct RegionBins {
    pub(crate) start_x: f32,
    pub(crate) start_y: f32,
    pub(crate) bin_w: f32,
    pub(crate) bin_h: f32,
    pub(crate) samples_x: u32,
    pub(crate) samples_y: u32,
}

impl RegionBins {
    /// Map a region into feature space. Returns `None` for zero or negative extents.
    pub(crate) fn new(
        roi: &Roi,
        spatial_scale: f32,
        pooled_h: u32,
        pooled_w: u32,
        samples_y: u32,
        samples_x: u32,
    ) -> Option<Self> {
        if !(roi.x2 > roi.x1) || !(roi.y2 > roi.y1) {
            return None;
        }
        let start_x = roi.x1 * spatial_scale;
        let start_y = roi.y1 * spatial_scale;
        let end_x = roi.x2 * spatial_scale;
        let end_y = roi.y2 * spatial_scale;
        let roi_w = (end_x - start_x).max(MIN_EXTENT);
        let roi_h = (end_y - start_y).max(MIN_EXTENT);
        Some(Self {
            start_x,
            start_y,
            bin_w: roi_w / pooled_w as f32,
            bin_h: roi_h / pooled_h as f32,
            samples_x: samples_x.max(1),
            samples_y: samples_y.max(1),
        })
    }

    /// Number of samples averaged per bin.
    pub(crate) fn sample_count(&self) -> u32 {
        self.samples_x * self.samples_y
    }

    /// Sample `(iy, ix)` of bin `(ph, pw)` as `(y, x)`.
    #[inline]
    pub(crate) fn sample_point(&self, ph: u32, pw: u32, iy: u32, ix: u32) -> (f32, f32) {
        let fy = ph as f32 + (iy as f32 + 0.5) / self.samples_y as f32;
        let fx = pw as f32 + (ix as f32 + 0.5) / self.samples_x as f32;
        (self.start_y + fy * self.bin_h, self.start_x + fx * self.bin_w)
    }
}

/// Four integer neighbours and weights of one bilinear sample.
///
/// Tap order is `(y_low, x_low)`, `(y_low, x_high)`, `(y_high, x_low)`, `(y_high, x_high)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BilinearTaps {
    pub y_low: usize,
    pub y_high: usize,
    pub x_low: usize,
    pub x_high: usize,
    pub weights: [f32; 4],
}

impl BilinearTaps {
    /// `(y, x)` index of each tap, in weight order.
    pub fn positions(&self) -> [(usize, usize); 4] {
        [
            (self.y_low, self.x_low),
            (self.y_low, self.x_high),
            (self.y_high, self.x_low),
            (self.y_high, self.x_high),
        ]
    }

    /// Interpolate a single `(height, width)` plane.
    #[inline]
    pub fn interpolate(&self, plane: &[f32], width: usize) -> f32 {
        let row_low = self.y_low * width;
        let row_high = self.y_high * width;
        self.weights[0] * plane[row_low + self.x_low]
            + self.weights[1] * plane[row_low + self.x_high]
            + self.weights[2] * plane[row_high + self.x_low]
            + self.weights[3] * plane[row_high + self.x_high]
    }
}

/// Bilinear taps of point `(y, x)` on a `height × width` grid.
///
/// Points more than one cell outside the grid yield `None` (they sample zero). Points on the
/// fringe are clamped so every returned index is in range.
pub fn bilinear_taps(y: f32, x: f32, height: usize, width: usize) -> Option<BilinearTaps> {
    if height == 0 || width == 0 {
        return None;
    }
    // Written as an in-range test so NaN points sample zero.
    if !(y >= -1.0 && y <= height as f32 && x >= -1.0 && x <= width as f32) {
        return None;
    }
    let (y_low, y_high, y) = clamp_axis(y.max(0.0), height);
    let (x_low, x_high, x) = clamp_axis(x.max(0.0), width);

    let ly = y - y_low as f32;
    let lx = x - x_low as f32;
    let hy = 1.0 - ly;
    let hx = 1.0 - lx;

    Some(BilinearTaps {
        y_low,
        y_high,
        x_low,
        x_high,
        weights: [hy * hx, hy * lx, ly * hx, ly * lx],
    })
}

fn clamp_axis(v: f32, size: usize) -> (usize, usize, f32) {
    let low = v.floor() as usize;
    if low >= size - 1 {
        let last = size - 1;
        (last, last, last as f32)
    } else {
        (low, low + 1, v)
    }
}
