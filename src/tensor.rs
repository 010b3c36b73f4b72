//! Dense buffers and region lists consumed by the pooling operator.

use core::fmt;

use crate::pool::PoolError;

/// Number of `f32` values per region row: `(batch_index, x1, y1, x2, y2)`.
pub const ROI_STRIDE: usize = 5;

/// Execution device a buffer is resident on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Device {
    /// Host memory, executed by the CPU backend.
    #[default]
    Cpu,
    /// Default WGPU adapter.
    Wgpu,
    /// CUDA device by ordinal.
    Cuda { index: usize },
}

/// Device tag without the ordinal, used for placement checks and errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Wgpu,
    Cuda,
}

impl Device {
    pub fn kind(self) -> DeviceKind {
        match self {
            Device::Cpu => DeviceKind::Cpu,
            Device::Wgpu => DeviceKind::Wgpu,
            Device::Cuda { .. } => DeviceKind::Cuda,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Wgpu => "wgpu",
            DeviceKind::Cuda => "cuda",
        };
        f.write_str(name)
    }
}

/// Four-axis shape `(n, c, h, w)`, row-major.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape4 {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl Shape4 {
    pub const fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self { n, c, h, w }
    }

    /// Total element count, or `None` on overflow.
    pub fn checked_numel(&self) -> Option<usize> {
        self.n
            .checked_mul(self.c)
            .and_then(|v| v.checked_mul(self.h))
            .and_then(|v| v.checked_mul(self.w))
    }

    /// Total element count.
    pub fn numel(&self) -> usize {
        self.n * self.c * self.h * self.w
    }

    /// Elements in one `(h, w)` plane.
    pub fn plane(&self) -> usize {
        self.h * self.w
    }

    /// Flat row-major offset of `(n, c, y, x)`.
    #[inline]
    pub fn offset(&self, n: usize, c: usize, y: usize, x: usize) -> usize {
        ((n * self.c + c) * self.h + y) * self.w + x
    }

    pub fn dims(&self) -> [usize; 4] {
        [self.n, self.c, self.h, self.w]
    }
}

impl fmt::Display for Shape4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.n, self.c, self.h, self.w)
    }
}

/// Dense `f32` buffer with an explicit 4-D shape and device residency.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor4 {
    shape: Shape4,
    data: Vec<f32>,
    device: Device,
}

/// Input feature map `(batch, channels, height, width)`.
pub type FeatureMap = Tensor4;
/// Pooled output or upstream gradient `(num_rois, channels, pooled_h, pooled_w)`.
pub type PooledOutput = Tensor4;
/// Gradient w.r.t. the feature map, same shape as the feature map.
pub type FeatureMapGradient = Tensor4;

impl Tensor4 {
    /// Wrap a host buffer. The length must match the shape exactly.
    pub fn new(shape: Shape4, data: Vec<f32>) -> Result<Self, PoolError> {
        let expected = shape
            .checked_numel()
            .ok_or_else(|| PoolError::InvalidInput(format!("shape {shape} overflows usize")))?;
        if data.len() != expected {
            return Err(PoolError::InvalidInput(format!(
                "buffer of {} values does not match shape {shape}",
                data.len()
            )));
        }
        Ok(Self {
            shape,
            data,
            device: Device::Cpu,
        })
    }

    /// Zero-filled buffer on the given device.
    pub fn zeros(shape: Shape4, device: Device) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.numel()],
            device,
        }
    }

    /// Re-tag the buffer as resident on `device`.
    pub fn to_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub(crate) fn from_parts(shape: Shape4, data: Vec<f32>, device: Device) -> Self {
        debug_assert_eq!(shape.numel(), data.len());
        Self {
            shape,
            data,
            device,
        }
    }

    pub fn shape(&self) -> Shape4 {
        self.shape
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Element at `(n, c, y, x)`, or `None` when out of range.
    pub fn get(&self, n: usize, c: usize, y: usize, x: usize) -> Option<f32> {
        let s = self.shape;
        if n >= s.n || c >= s.c || y >= s.h || x >= s.w {
            return None;
        }
        self.data.get(s.offset(n, c, y, x)).copied()
    }
}

/// One axis-aligned region in image coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Roi {
    pub batch_index: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Roi {
    pub const fn new(batch_index: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            batch_index,
            x1,
            y1,
            x2,
            y2,
        }
    }

    /// Batch index truncated toward zero, as the buffer layout prescribes.
    pub fn batch(&self) -> i64 {
        self.batch_index as i64
    }
}

/// Region list `(num_rois, 5)`, row-major `(batch_index, x1, y1, x2, y2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionList {
    data: Vec<f32>,
    device: Device,
}

impl RegionList {
    /// Wrap a flat `(num_rois, 5)` buffer.
    pub fn new(data: Vec<f32>) -> Result<Self, PoolError> {
        if data.len() % ROI_STRIDE != 0 {
            return Err(PoolError::InvalidInput(format!(
                "region buffer length {} is not a multiple of {ROI_STRIDE}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            device: Device::Cpu,
        })
    }

    pub fn from_rois(rois: &[Roi]) -> Self {
        let mut data = Vec::with_capacity(rois.len() * ROI_STRIDE);
        for roi in rois {
            data.extend_from_slice(&[roi.batch_index, roi.x1, roi.y1, roi.x2, roi.y2]);
        }
        Self {
            data,
            device: Device::Cpu,
        }
    }

    pub fn to_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn len(&self) -> usize {
        self.data.len() / ROI_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Region `index`; panics when out of range like slice indexing.
    pub fn roi(&self, index: usize) -> Roi {
        let row = &self.data[index * ROI_STRIDE..(index + 1) * ROI_STRIDE];
        Roi::new(row[0], row[1], row[2], row[3], row[4])
    }

    pub fn iter(&self) -> impl Iterator<Item = Roi> + '_ {
        self.data
            .chunks_exact(ROI_STRIDE)
            .map(|row| Roi::new(row[0], row[1], row[2], row[3], row[4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_rejects_mismatched_length() {
        let err = Tensor4::new(Shape4::new(1, 1, 2, 2), vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, PoolError::InvalidInput(_)));
    }

    #[test]
    fn offset_is_row_major() {
        let shape = Shape4::new(2, 3, 4, 5);
        assert_eq!(shape.offset(0, 0, 0, 1), 1);
        assert_eq!(shape.offset(0, 0, 1, 0), 5);
        assert_eq!(shape.offset(0, 1, 0, 0), 20);
        assert_eq!(shape.offset(1, 0, 0, 0), 60);
        assert_eq!(shape.offset(1, 2, 3, 4), shape.numel() - 1);
        assert_eq!(shape.dims(), [2, 3, 4, 5]);
    }

    #[test]
    fn region_list_rows_and_truncation() {
        let rois = RegionList::new(vec![1.9, 0.0, 1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 7.0]).unwrap();
        assert_eq!(rois.len(), 2);
        assert_eq!(rois.roi(0).batch(), 1);
        assert_eq!(rois.roi(1), Roi::new(0.0, 4.0, 5.0, 6.0, 7.0));
        assert!(RegionList::new(vec![0.0; 7]).is_err());
    }

    #[test]
    fn device_kind_tags() {
        assert_eq!(Device::Cuda { index: 3 }.kind(), DeviceKind::Cuda);
        assert_eq!(Tensor4::zeros(Shape4::new(1, 1, 1, 1), Device::Wgpu).device(), Device::Wgpu);
    }
}
