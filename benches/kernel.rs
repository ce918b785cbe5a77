#[macro_use]
extern crate criterion;
extern crate mandelsplit;
extern crate num;

use criterion::Criterion;
use mandelsplit::kernel::escape_time;
use mandelsplit::{render_sequential, Config, Viewport};
use num::Complex;

fn kernel(c: &mut Criterion) {
    c.bench_function("escape_time inside the set", |b| {
        b.iter(|| escape_time(Complex::new(-0.1, 0.1), 1000))
    });
    c.bench_function("sequential 64x64", |b| {
        let config = Config::new(64, 64, 200, Viewport::default()).unwrap();
        b.iter(|| render_sequential(&config).unwrap())
    });
}

criterion_group!(benches, kernel);
criterion_main!(benches);
