//! Module benchmarks.
//!
//! Both modules are driven one sample at a time through `Module::process`,
//! which is how a host calls them.

mod bernoulli;
mod generator;

pub use bernoulli::bench_bernoulli;
pub use generator::bench_generator;
