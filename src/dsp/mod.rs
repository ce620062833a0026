//! Low-level DSP primitives shared by the modules.
//!
//! These components are allocation-free and realtime-safe once built (the
//! wavetable bank allocates in its constructor only), making them safe to
//! embed directly inside module structs. They stay focused on the
//! signal-processing math; the modules layer state machines and port
//! handling on top.

/// Fixed-point scaling, clamping and voltage rescaling.
pub mod fixed;
/// Two-pole low-pass used to smooth generator output.
pub mod filter;
/// Triangle wavefolder.
pub mod fold;
/// Indicator light brightness with smoothed decay.
pub mod light;
/// Short/long press detection for momentary buttons.
pub mod press;
/// Lock-free uniform random source.
pub mod random;
/// Schmitt and boolean edge triggers.
pub mod trigger;
/// Band-limited wavetable bank.
pub mod wavetable;

pub use light::Light;
pub use press::{Press, PressDetector};
pub use random::{FastUniform, UniformSource};
pub use trigger::{BooleanTrigger, Edge, SchmittTrigger};
