pub mod dsp; // Realtime-safe primitives
pub mod generator; // Buffered envelope/oscillator core
pub mod io;
pub mod modules; // Host-facing modules
#[cfg(feature = "serde")]
pub mod patch; // Mode persistence

pub use generator::{GeneratorMode, GeneratorRange, BLOCK_SIZE, NUM_BLOCKS};
pub use io::Input;
pub use modules::{
    BernoulliGate, BufferedEnvelopeGenerator, Module, ModuleMessage, OutMode, ProcessCtx, TossMode,
};
