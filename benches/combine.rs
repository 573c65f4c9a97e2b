use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kurbo::{BezPath, Circle, Rect, Shape as _};
use pathcombine::{combine, FillRule, PathOp};

fn square_grid(n: usize, offset: f64) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..n {
        for j in 0..n {
            let x = 2.0 * i as f64 + offset;
            let y = 2.0 * j as f64 + offset;
            path.extend(Rect::new(x, y, x + 1.4, y + 1.4).to_path(1e-9));
        }
    }
    path
}

fn circle_row(n: usize, y: f64) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..n {
        path.extend(Circle::new((1.5 * i as f64, y), 1.0).to_path(1e-9));
    }
    path
}

fn grids(c: &mut Criterion) {
    let a = square_grid(6, 0.0);
    let b = square_grid(6, 0.7);

    c.bench_function("grid union", |bench| {
        bench.iter(|| black_box(combine(&a, &b, FillRule::NonZero, PathOp::Union)))
    });
    c.bench_function("grid xor", |bench| {
        bench.iter(|| black_box(combine(&a, &b, FillRule::EvenOdd, PathOp::Xor)))
    });
}

fn circles(c: &mut Criterion) {
    let a = circle_row(8, 0.0);
    let b = circle_row(8, 0.8);

    c.bench_function("circles union", |bench| {
        bench.iter(|| black_box(combine(&a, &b, FillRule::NonZero, PathOp::Union)))
    });
    c.bench_function("circles intersection", |bench| {
        bench.iter(|| black_box(combine(&a, &b, FillRule::NonZero, PathOp::Intersection)))
    });
}

criterion_group!(benches, grids, circles);
criterion_main!(benches);
