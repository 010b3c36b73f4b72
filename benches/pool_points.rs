use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pool_points_interp::{backward, forward, PoolOptions, RegionList, Roi, Shape4, Tensor4};

fn fixture() -> (Tensor4, RegionList, PoolOptions) {
    let shape = Shape4::new(2, 256, 50, 68);
    let data = (0..shape.numel()).map(|i| (i % 97) as f32 * 0.01).collect();
    let input = Tensor4::new(shape, data).expect("fixture shape");
    let rois: Vec<Roi> = (0..128)
        .map(|i| {
            let x = (i * 37 % 800) as f32;
            let y = (i * 53 % 600) as f32;
            Roi::new((i % 2) as f32, x, y, x + 64.0 + i as f32, y + 48.0 + i as f32)
        })
        .collect();
    (input, RegionList::from_rois(&rois), PoolOptions::new(7, 7, 1.0 / 16.0))
}

fn bench_cpu(c: &mut Criterion) {
    let (input, rois, options) = fixture();
    let shape = input.shape();
    let out = forward(&input, &rois, &options).expect("forward");
    let grad = Tensor4::new(out.shape(), vec![1.0; out.shape().numel()]).expect("grad shape");

    c.bench_function("forward_cpu_128x256x7x7", |b| {
        b.iter(|| forward(black_box(&input), black_box(&rois), &options).expect("forward"))
    });
    c.bench_function("backward_cpu_128x256x7x7", |b| {
        b.iter(|| {
            backward(black_box(&grad), black_box(&rois), &options, shape.n, shape.c, shape.h, shape.w)
                .expect("backward")
        })
    });
}

criterion_group!(benches, bench_cpu);
criterion_main!(benches);
