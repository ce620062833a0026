//! Host-facing modules.
//!
//! Each module owns all of its state and is driven one sample at a time
//! through [`Module::process`]. Persistence (see `crate::patch`) only
//! touches the small mode fields exposed through `persisted()` and
//! `restore()`; the host must never run it concurrently with `process`.

pub mod bernoulli;
pub mod envelope;
pub mod message;

pub use bernoulli::{BernoulliGate, BernoulliInputs, BernoulliOutputs, OutMode, TossMode};
pub use envelope::{BufferedEnvelopeGenerator, EnvelopeInputs, EnvelopeOutputs};
pub use message::{MessageReceiver, MessageTarget, ModuleMessage};

/// Context passed to modules on every sample
///
/// - sample_rate: host sample rate in Hz (e.g. 48000.0)
/// - sample_time: seconds per sample, `1 / sample_rate`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCtx {
    pub sample_rate: f32,
    pub sample_time: f32,
}

impl ProcessCtx {
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            crate::generator::NOMINAL_SAMPLE_RATE
        };
        Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
        }
    }
}

impl Default for ProcessCtx {
    fn default() -> Self {
        Self::new(crate::generator::NOMINAL_SAMPLE_RATE)
    }
}

/// Core trait for per-sample modules
///
/// Inputs and outputs are plain `Copy` structs so a host adapter can fill
/// them from its own port arrays without allocating.
pub trait Module: Send {
    type Inputs;
    type Outputs: Copy;

    fn process(&mut self, inputs: &Self::Inputs, ctx: &ProcessCtx) -> Self::Outputs;

    /// Return to the power-on state.
    fn reset(&mut self);
}
