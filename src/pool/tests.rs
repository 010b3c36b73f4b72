use approx::assert_relative_eq;

use super::*;
use crate::tensor::{Device, DeviceKind, FeatureMap, RegionList, Roi, Shape4, Tensor4};

fn ramp_map(shape: Shape4) -> FeatureMap {
    let data = (0..shape.numel()).map(|i| i as f32).collect();
    Tensor4::new(shape, data).unwrap()
}

#[test]
fn forward_hand_computed_example() {
    let input = ramp_map(Shape4::new(1, 1, 4, 4));
    let rois = RegionList::from_rois(&[Roi::new(0.0, 0.0, 0.0, 4.0, 4.0)]);
    let op = PointPool::new(PoolOptions::new(2, 2, 1.0)).unwrap();
    let out = op.forward(&input, &rois).unwrap();
    assert_eq!(out.shape(), Shape4::new(1, 1, 2, 2));
    assert_eq!(out.as_slice(), &[5.0, 7.0, 13.0, 15.0]);
}

#[test]
fn backward_shape_contract_and_mass() {
    let rois = RegionList::from_rois(&[
        Roi::new(0.0, 0.0, 0.0, 3.0, 3.0),
        Roi::new(0.0, 0.5, 0.5, 2.5, 2.5),
        Roi::new(0.0, 1.0, 1.0, 1.0, 2.0),
    ]);
    let options = PoolOptions::new(2, 2, 1.0);
    let grad = Tensor4::new(Shape4::new(3, 1, 2, 2), vec![1.0; 12]).unwrap();
    let d_input = backward(&grad, &rois, &options, 4, 1, 4, 4).unwrap();
    assert_eq!(d_input.shape(), Shape4::new(4, 1, 4, 4));
    // The degenerate third region contributes nothing.
    let total: f32 = d_input.as_slice().iter().sum();
    assert_relative_eq!(total, 8.0, epsilon = 1e-5);
}

#[test]
fn forward_then_backward_is_adjoint() {
    // <forward(x), g> == <x, backward(g)> for the linear operator.
    let shape = Shape4::new(2, 2, 5, 5);
    let input = Tensor4::new(
        shape,
        (0..shape.numel()).map(|i| ((i * 37) % 11) as f32 - 5.0).collect(),
    )
    .unwrap();
    let rois = RegionList::from_rois(&[
        Roi::new(1.0, 2.0, 2.0, 18.0, 14.0),
        Roi::new(0.0, -4.0, 4.0, 10.0, 22.0),
    ]);
    let op = PointPool::new(PoolOptions::new(3, 3, 0.25).with_samples(2, 2)).unwrap();
    let out = op.forward(&input, &rois).unwrap();
    let g: Vec<f32> = (0..out.shape().numel()).map(|i| (i % 5) as f32 - 2.0).collect();
    let grad = Tensor4::new(out.shape(), g.clone()).unwrap();
    let d_input = op.backward(&grad, &rois, shape).unwrap();

    let lhs: f64 = out.as_slice().iter().zip(&g).map(|(a, b)| *a as f64 * *b as f64).sum();
    let rhs: f64 = input
        .as_slice()
        .iter()
        .zip(d_input.as_slice())
        .map(|(a, b)| *a as f64 * *b as f64)
        .sum();
    assert_relative_eq!(lhs, rhs, epsilon = 1e-3);
}

#[test]
fn mismatched_region_placement_is_unsupported() {
    let input = ramp_map(Shape4::new(1, 1, 4, 4));
    let rois = RegionList::from_rois(&[Roi::new(0.0, 0.0, 0.0, 4.0, 4.0)]).to_device(Device::Wgpu);
    let err = forward(&input, &rois, &PoolOptions::new(2, 2, 1.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedDevice);
    assert!(matches!(
        err,
        PoolError::UnsupportedDevice {
            device: DeviceKind::Wgpu,
            op: "forward"
        }
    ));
}

#[cfg(not(feature = "cuda"))]
#[test]
fn missing_backend_is_a_configuration_error() {
    let input = ramp_map(Shape4::new(1, 1, 4, 4)).to_device(Device::Cuda { index: 0 });
    let rois = RegionList::from_rois(&[]).to_device(Device::Cuda { index: 0 });
    let err = forward(&input, &rois, &PoolOptions::new(2, 2, 1.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.to_string(), "not compiled with cuda support");
    assert!(backend_capabilities(Device::Cuda { index: 1 }).is_err());
}

#[test]
fn out_of_range_batch_index_is_rejected() {
    let input = ramp_map(Shape4::new(2, 1, 4, 4));
    let rois = RegionList::from_rois(&[Roi::new(2.0, 0.0, 0.0, 4.0, 4.0)]);
    let err = forward(&input, &rois, &PoolOptions::new(2, 2, 1.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let rois = RegionList::from_rois(&[Roi::new(-1.0, 0.0, 0.0, 4.0, 4.0)]);
    assert!(forward(&input, &rois, &PoolOptions::new(2, 2, 1.0)).is_err());

    let rois = RegionList::from_rois(&[Roi::new(0.0, f32::NAN, 0.0, 4.0, 4.0)]);
    assert!(forward(&input, &rois, &PoolOptions::new(2, 2, 1.0)).is_err());

    for batch_index in [f32::NAN, f32::INFINITY] {
        let rois = RegionList::from_rois(&[Roi::new(batch_index, 0.0, 0.0, 4.0, 4.0)]);
        let err = forward(&input, &rois, &PoolOptions::new(2, 2, 1.0)).unwrap_err();
        assert!(matches!(err, PoolError::InvalidInput(_)));
        let grad = Tensor4::zeros(Shape4::new(1, 1, 2, 2), Device::Cpu);
        assert!(backward(&grad, &rois, &PoolOptions::new(2, 2, 1.0), 2, 1, 4, 4).is_err());
    }
}

#[test]
fn overflowing_region_extent_samples_zero() {
    let input = ramp_map(Shape4::new(1, 1, 4, 4));
    let rois = RegionList::from_rois(&[Roi::new(0.0, -3e38, 0.0, 3e38, 4.0)]);
    let options = PoolOptions::new(2, 2, 2.0);
    let out = forward(&input, &rois, &options).unwrap();
    assert_eq!(out.into_vec(), vec![0.0; 4]);

    let grad = Tensor4::new(Shape4::new(1, 1, 2, 2), vec![1.0; 4]).unwrap();
    let grad_input = backward(&grad, &rois, &options, 1, 1, 4, 4).unwrap();
    assert!(grad_input.as_slice().iter().all(|&g| g == 0.0));
}

#[test]
fn backward_rejects_mismatched_gradient_shape() {
    let rois = RegionList::from_rois(&[Roi::new(0.0, 0.0, 0.0, 4.0, 4.0)]);
    let grad = Tensor4::new(Shape4::new(1, 2, 3, 2), vec![0.0; 12]).unwrap();
    let err = backward(&grad, &rois, &PoolOptions::new(2, 2, 1.0), 1, 2, 4, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn invalid_options_are_rejected() {
    assert!(PointPool::new(PoolOptions::new(0, 2, 1.0)).is_err());
    assert!(PointPool::new(PoolOptions::new(2, 2, 0.0)).is_err());
    assert!(PointPool::new(PoolOptions::new(2, 2, f32::INFINITY)).is_err());
    assert!(PointPool::new(PoolOptions::new(2, 2, 1.0).with_samples(0, 1)).is_err());
    assert!(PoolOptions::default().validate().is_ok());
}

#[test]
fn display_matches_layer_repr() {
    let op = PointPool::new(PoolOptions::new(7, 5, 0.0625)).unwrap();
    assert_eq!(op.options().pooled_width, 5);
    assert_eq!(op.to_string(), "PointPool(output_size=(7, 5), spatial_scale=0.0625)");
}

#[test]
fn cpu_backend_reports_atomic_add() {
    let caps = backend_capabilities(Device::Cpu).unwrap();
    assert!(caps.atomic_add_f32);
    assert!(!caps.accelerator);
}
