//! Bernoulli gate under a fast clock.

use std::hint::black_box;

use bernoulli_tides::{
    modules::bernoulli::BernoulliInputs, BernoulliGate, Input, Module, OutMode, ProcessCtx,
};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_bernoulli(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bernoulli");
    let ctx = ProcessCtx::new(48_000.0);

    for &size in BLOCK_SIZES {
        // A trigger every 8 samples keeps the coin busy.
        let inputs: Vec<BernoulliInputs> = (0..size)
            .map(|i| {
                let mut inputs = BernoulliInputs::default();
                let v = if i % 8 < 4 { 10.0 } else { 0.0 };
                for channel in &mut inputs.channels {
                    channel.input = Input::patched(v);
                    channel.threshold = 0.5;
                }
                inputs
            })
            .collect();

        for mode in [OutMode::Gate, OutMode::Through] {
            let mut gate = BernoulliGate::new().with_seed(1);
            gate.set_out_mode(0, mode);
            gate.set_out_mode(1, mode);
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}").to_lowercase(), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for sample in &inputs {
                            black_box(gate.process(black_box(sample), &ctx));
                        }
                    })
                },
            );
        }
    }

    group.finish();
}
