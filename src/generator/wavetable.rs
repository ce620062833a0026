//! Wavetable strategy: morphing bank oscillator with a lo-fi smoothness.

use super::{
    shape::{phase_increment, unit_to_phase, PHASE_SPAN},
    ControlByte, GeneratorParams, GeneratorRange, GeneratorSample,
};
use crate::dsp::{
    fixed::parameter_to_unit,
    wavetable::{WavetableBank, WAVE_COUNT},
};

/// Longest sample-and-hold period at smoothness -1.
const MAX_HOLD_SAMPLES: f32 = 32.0;
/// Bits removed at smoothness +1.
const MAX_BITS_REMOVED: f32 = 13.0;
const PEAK_SPAN: f32 = 0.48;

pub(super) struct WavetableRenderer {
    bank: WavetableBank,
    phase: u32,
    hold_counter: u32,
    held: f32,
}

impl WavetableRenderer {
    pub fn new() -> Self {
        Self {
            bank: WavetableBank::new(),
            phase: 0,
            hold_counter: 0,
            held: 0.0,
        }
    }

    pub fn render(
        &mut self,
        params: &GeneratorParams,
        range: GeneratorRange,
        input: &[ControlByte],
        output: &mut [GeneratorSample],
    ) {
        let increment = phase_increment(params.pitch, range);
        let position = (parameter_to_unit(params.shape) + 1.0) * 0.5 * (WAVE_COUNT - 1) as f32;
        let peak = 0.5 + PEAK_SPAN * parameter_to_unit(params.slope);
        let peak_phase = unit_to_phase(peak);

        let smoothness = parameter_to_unit(params.smoothness);
        let hold = if smoothness < 0.0 {
            1 + (-smoothness * (MAX_HOLD_SAMPLES - 1.0)) as u32
        } else {
            1
        };
        let levels = if smoothness > 0.0 {
            let bits = 16.0 - smoothness * MAX_BITS_REMOVED;
            Some(2f32.powf(bits - 1.0))
        } else {
            None
        };

        for (control, out) in input.iter().zip(output.iter_mut()) {
            let mut flags = 0;
            if control.has(ControlByte::GATE_RISING) {
                self.phase = 0;
                self.hold_counter = 0;
            } else if !control.has(ControlByte::FREEZE) {
                let (next, wrapped) = self.phase.overflowing_add(increment);
                self.phase = next;
                if wrapped {
                    flags |= GeneratorSample::END_OF_RELEASE;
                }
            }
            if self.phase >= peak_phase {
                flags |= GeneratorSample::END_OF_ATTACK;
            }

            if self.hold_counter == 0 {
                let warped = warp(self.phase, peak);
                let mut value = self.bank.sample(position, warped);
                if let Some(levels) = levels {
                    value = (value * levels).round() / levels;
                }
                self.held = value.clamp(-1.0, 1.0);
            }
            self.hold_counter = (self.hold_counter + 1) % hold;

            *out = GeneratorSample {
                unipolar: ((self.held + 1.0) * 0.5 * 65_535.0) as u16,
                bipolar: (self.held * 32_767.0) as i16,
                flags,
            };
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0;
        self.hold_counter = 0;
        self.held = 0.0;
    }
}

/// Phase distortion: the first half of the table plays over `peak` of the
/// cycle and the second half over the rest.
#[inline]
fn warp(phase: u32, peak: f32) -> u32 {
    let p = (f64::from(phase) / PHASE_SPAN) as f32;
    let warped = if p < peak {
        0.5 * p / peak
    } else {
        0.5 + 0.5 * (p - peak) / (1.0 - peak)
    };
    unit_to_phase(warped)
}
