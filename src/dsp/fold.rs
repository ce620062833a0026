//! Wavefolding
//!
//! A wavefolder adds harmonics by reflecting the waveform back on itself
//! whenever it leaves the ±threshold window. Unlike clipping, the energy
//! that would be cut off is mirrored back inside, so increasing the gain
//! keeps adding new peaks instead of flattening into a square.
//!
//! # The Transfer Function
//!
//! ```text
//!   out
//!    1 ┤    ╱╲      ╱
//!      │   ╱  ╲    ╱
//!    0 ┤──╱────╲──╱──── in · gain
//!      │ ╱      ╲╱
//!   -1 ┤╱
//! ```
//!
//! This is a triangle wave of the input with period 4·threshold. It is
//! evaluated in closed form, so the cost is constant no matter how far
//! the driven signal overshoots.
//!
//! # Gain Values
//!
//!   1.0  = transparent for a full-scale input
//!   2.0  = each peak folds once
//!   4.0+ = dense, metallic folds

/// Fold `sample · gain` back into `[-threshold, threshold]`.
#[inline]
pub fn fold(sample: f32, gain: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 {
        return 0.0;
    }
    let x = sample * gain;
    if !x.is_finite() {
        return 0.0;
    }
    if (-threshold..=threshold).contains(&x) {
        return x;
    }

    // Shift so the window starts at 0, wrap into one period, mirror the
    // upper half.
    let period = 4.0 * threshold;
    let shifted = (x + threshold).rem_euclid(period);
    if shifted <= 2.0 * threshold {
        shifted - threshold
    } else {
        3.0 * threshold - shifted
    }
}

/// Fold an entire buffer in place.
pub fn fold_buffer(buffer: &mut [f32], gain: f32, threshold: f32) {
    for sample in buffer.iter_mut() {
        *sample = fold(*sample, gain, threshold);
    }
}
