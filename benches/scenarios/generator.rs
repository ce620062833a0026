//! Buffered generator in each rendering strategy.

use std::hint::black_box;

use bernoulli_tides::{
    modules::envelope::EnvelopeInputs, BufferedEnvelopeGenerator, GeneratorRange, Module,
    ProcessCtx,
};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/generator");
    let ctx = ProcessCtx::new(48_000.0);

    let strategies = [
        ("audio_rate", GeneratorRange::High, false, 0.0),
        ("audio_rate_folded", GeneratorRange::High, false, 0.7),
        ("control_rate_filtered", GeneratorRange::Medium, false, -0.7),
        ("wavetable", GeneratorRange::High, true, 0.0),
    ];

    for &size in BLOCK_SIZES {
        for (name, range, wavetable, smoothness) in strategies {
            let mut module = BufferedEnvelopeGenerator::new(48_000.0).with_wavetable(wavetable);
            module.set_range(range);
            let inputs = EnvelopeInputs {
                smoothness,
                ..EnvelopeInputs::default()
            };
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    for _ in 0..size {
                        black_box(module.process(black_box(&inputs), &ctx));
                    }
                })
            });
        }
    }

    group.finish();
}
