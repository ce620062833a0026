//! Uniform random draws that are safe to take on the audio thread.
//!
//! Each module owns its own generator, so a draw is a few integer ops on
//! local state: no global RNG, no locks, no allocation.

use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Source of uniform floats in `[0, 1)`.
pub trait UniformSource: Send {
    fn uniform(&mut self) -> f32;
}

/// Default source backed by `SmallRng`.
pub struct FastUniform {
    rng: SmallRng,
}

impl FastUniform {
    /// Seeded from OS entropy. Call this off the audio thread.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible sequence, handy for tests and offline renders.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl UniformSource for FastUniform {
    #[inline]
    fn uniform(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

impl<T: UniformSource + ?Sized> UniformSource for Box<T> {
    fn uniform(&mut self) -> f32 {
        (**self).uniform()
    }
}
