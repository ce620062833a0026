//! Two-pole smoothing filter used by the generator's smoothness pass.

use std::f32::consts::PI;

/*
State-Variable Low-Pass
=======================

Topology-preserving (trapezoidal) state-variable filter. Only the low-pass
tap is used here: it rounds off the corners of the generator's ramps as
the smoothness control goes negative.

  g    = tan(π · fc / fs)          prewarped integrator gain
  k    = 2                         damping (no resonance)

Per sample:

  v3 = x - ic2
  v1 = (ic1 + g · v3) / (1 + g · (g + k))
  v2 = ic2 + g · v1
  ic1 = 2 · v1 - ic1
  ic2 = 2 · v2 - ic2
  low-pass = v2

The cutoff is given as a fraction of the sample rate so the filter never
needs to know the host rate; the generator always runs at its nominal
rate. Fractions are clamped below Nyquist, where tan() blows up.
*/

/// Highest cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.49;
/// Lowest cutoff as a fraction of the sample rate.
const MIN_CUTOFF_RATIO: f32 = 1.0e-6;
/// Q = 0.5, critically damped.
const DAMPING: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct SmoothingFilter {
    ic1eq: f32,
    ic2eq: f32,
    g: f32,
}

impl SmoothingFilter {
    pub fn new() -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
        };
        filter.set_cutoff_ratio(MAX_CUTOFF_RATIO);
        filter
    }

    /// Cutoff as `fc / fs`.
    pub fn set_cutoff_ratio(&mut self, ratio: f32) {
        let ratio = ratio.clamp(MIN_CUTOFF_RATIO, MAX_CUTOFF_RATIO);
        self.g = (PI * ratio).tan();
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let h = 1.0 / (1.0 + self.g * (self.g + DAMPING));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self::new()
    }
}
