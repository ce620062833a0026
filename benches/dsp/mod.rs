//! Benchmarks for low-level DSP primitives.

mod filter;
mod fold;
mod wavetable;

pub use filter::bench_filter;
pub use fold::bench_fold;
pub use wavetable::bench_wavetable;
