//! Benchmarks for the wavefolder.

use std::hint::black_box;

use bernoulli_tides::dsp::fold::fold_buffer;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/fold");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32 * std::f32::consts::TAU).sin())
            .collect();

        for gain in [1.5f32, 5.0] {
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("gain_{gain}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        fold_buffer(black_box(&mut buffer), gain, 1.0);
                    })
                },
            );
        }
    }

    group.finish();
}
