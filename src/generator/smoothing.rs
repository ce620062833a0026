//! Smoothness pass: low-pass below zero, wavefolder above.

use super::{shape::PHASE_SPAN, GeneratorSample};
use crate::dsp::{
    filter::SmoothingFilter,
    fixed::parameter_to_unit,
    fold::{fold, fold_buffer},
};

/// Below this magnitude the pass leaves the block untouched.
const DEAD_ZONE: f32 = 1.0 / 0x7FFF as f32;
/// Octaves of cutoff above the oscillator frequency at smoothness 0.
const FILTER_OCTAVES: f32 = 7.0;
/// Fold gain added at smoothness +1.
const FOLD_DEPTH: f32 = 4.0;

pub(super) struct SmoothingPass {
    unipolar: SmoothingFilter,
    bipolar: SmoothingFilter,
    uni_scratch: [f32; super::BLOCK_SIZE],
    bi_scratch: [f32; super::BLOCK_SIZE],
}

impl SmoothingPass {
    pub fn new() -> Self {
        Self {
            unipolar: SmoothingFilter::new(),
            bipolar: SmoothingFilter::new(),
            uni_scratch: [0.0; super::BLOCK_SIZE],
            bi_scratch: [0.0; super::BLOCK_SIZE],
        }
    }

    /// `increment` is the phase increment the block was rendered with; the
    /// filter cutoff tracks it so smoothing sounds the same at any pitch.
    pub fn process(&mut self, smoothness: i16, increment: u32, block: &mut [GeneratorSample]) {
        let amount = parameter_to_unit(smoothness);
        if amount.abs() < DEAD_ZONE {
            // Keep the filters following the signal so engaging them later
            // does not start from a stale state.
            for sample in block.iter() {
                let (u, b) = unpack(sample);
                self.unipolar.next_sample(u);
                self.bipolar.next_sample(b);
            }
            return;
        }

        let len = block.len().min(super::BLOCK_SIZE);
        let block = &mut block[..len];
        for (i, sample) in block.iter().enumerate() {
            let (u, b) = unpack(sample);
            self.uni_scratch[i] = u;
            self.bi_scratch[i] = b;
        }
        let uni = &mut self.uni_scratch[..len];
        let bi = &mut self.bi_scratch[..len];

        if amount < 0.0 {
            let base = (f64::from(increment) / PHASE_SPAN) as f32;
            let cutoff = base * 2f32.powf((1.0 + amount) * FILTER_OCTAVES);
            self.unipolar.set_cutoff_ratio(cutoff);
            self.bipolar.set_cutoff_ratio(cutoff);
            self.unipolar.render(uni);
            self.bipolar.render(bi);
        } else {
            let gain = 1.0 + FOLD_DEPTH * amount;
            for u in uni.iter_mut() {
                // Fold within 0..1 so a resting envelope stays at zero.
                *u = 0.5 * (fold(2.0 * *u * gain - 1.0, 1.0, 1.0) + 1.0);
            }
            fold_buffer(bi, gain, 1.0);
        }

        for ((sample, &u), &b) in block.iter_mut().zip(uni.iter()).zip(bi.iter()) {
            sample.unipolar = (u.clamp(0.0, 1.0) * 65_535.0) as u16;
            sample.bipolar = (b.clamp(-1.0, 1.0) * 32_767.0) as i16;
        }
    }

    pub fn reset(&mut self) {
        self.unipolar.reset();
        self.bipolar.reset();
    }
}

#[inline]
fn unpack(sample: &GeneratorSample) -> (f32, f32) {
    (
        f32::from(sample.unipolar) / 65_535.0,
        f32::from(sample.bipolar) / 32_767.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::BLOCK_SIZE;

    fn block_of(unipolar: u16, bipolar: i16) -> [GeneratorSample; BLOCK_SIZE] {
        [GeneratorSample {
            unipolar,
            bipolar,
            flags: GeneratorSample::END_OF_ATTACK,
        }; BLOCK_SIZE]
    }

    #[test]
    fn zero_smoothness_is_transparent() {
        let mut pass = SmoothingPass::new();
        let mut block = block_of(0x1234, -0x0567);
        let before = block;
        pass.process(0, 1 << 24, &mut block);
        assert_eq!(block, before);
    }

    #[test]
    fn flags_survive_the_pass() {
        let mut pass = SmoothingPass::new();
        let mut block = block_of(0x8000, 0x4000);
        pass.process(-0x4000, 1 << 24, &mut block);
        assert!(block.iter().all(|s| s.end_of_attack()));
    }

    #[test]
    fn negative_smoothness_slews_steps() {
        let mut pass = SmoothingPass::new();
        let mut block = block_of(0xFFFF, 0x7FFF);
        pass.process(-0x7FFF, 1 << 20, &mut block);
        // A step into a heavily smoothed filter starts near zero.
        assert!(block[0].unipolar < 0x1000, "got {:#x}", block[0].unipolar);
        assert!(block[BLOCK_SIZE - 1].unipolar >= block[0].unipolar);
    }

    #[test]
    fn folding_keeps_a_resting_envelope_at_zero() {
        let mut pass = SmoothingPass::new();
        let mut block = block_of(0, -0x7FFF);
        pass.process(0x7FFF, 1 << 20, &mut block);
        assert!(block.iter().all(|s| s.unipolar == 0));
    }

    #[test]
    fn folding_changes_loud_samples() {
        let mut pass = SmoothingPass::new();
        let mut block = block_of(0xC000, 0x6000);
        pass.process(0x7FFF, 1 << 20, &mut block);
        assert!(block[0].unipolar < 0xC000);
    }
}
