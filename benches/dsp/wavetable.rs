//! Benchmarks for wavetable lookup and bank construction.

use std::hint::black_box;

use bernoulli_tides::dsp::wavetable::WavetableBank;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_wavetable(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavetable");

    // Built once per module, off the audio thread.
    group.bench_function("build_bank", |b| b.iter(|| black_box(WavetableBank::new())));

    let bank = WavetableBank::new();
    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let increment = u32::MAX / size as u32;
        group.bench_with_input(BenchmarkId::new("morph", size), &size, |b, _| {
            b.iter(|| {
                let mut phase = 0u32;
                for (i, out) in buffer.iter_mut().enumerate() {
                    let position = 3.5 + (i as f32 / size as f32);
                    *out = bank.sample(black_box(position), phase);
                    phase = phase.wrapping_add(increment);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
