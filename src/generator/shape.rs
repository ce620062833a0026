//! Pitch-to-increment conversion and the rise/fall waveshaper.

use super::{GeneratorRange, NOMINAL_SAMPLE_RATE};
use crate::dsp::fixed::{parameter_to_unit, pitch_to_semitones};

/// Frequency at 60 semitones (middle C).
pub const MIDDLE_C_HZ: f64 = 261.625_565;
/// Semitones subtracted from the pitch in each range.
pub const MEDIUM_RANGE_OFFSET: f32 = 84.0;
pub const LOW_RANGE_OFFSET: f32 = 120.0;

/// Phase accumulator span (one full cycle).
pub const PHASE_SPAN: f64 = 4_294_967_296.0;
const MAX_INCREMENT: u32 = 1 << 31;

fn range_offset(range: GeneratorRange) -> f32 {
    match range {
        GeneratorRange::High => 0.0,
        GeneratorRange::Medium => MEDIUM_RANGE_OFFSET,
        GeneratorRange::Low => LOW_RANGE_OFFSET,
    }
}

/// Oscillator frequency (Hz, at the nominal rate) for a fixed-point pitch.
pub fn frequency(pitch: i16, range: GeneratorRange) -> f64 {
    let semitones = f64::from(pitch_to_semitones(pitch) - range_offset(range));
    MIDDLE_C_HZ * 2f64.powf((semitones - 60.0) / 12.0)
}

/// Per-sample phase increment for a fixed-point pitch.
///
/// Never zero (the oscillator always moves) and never above half a cycle
/// per sample.
pub fn phase_increment(pitch: i16, range: GeneratorRange) -> u32 {
    let increment = frequency(pitch, range) / f64::from(NOMINAL_SAMPLE_RATE) * PHASE_SPAN;
    (increment as u32).clamp(1, MAX_INCREMENT)
}

/// Phase increment that completes one cycle every `period` samples.
pub fn increment_for_period(period: u32) -> u32 {
    ((PHASE_SPAN / f64::from(period.max(2))) as u32).clamp(1, MAX_INCREMENT)
}

#[inline]
pub fn phase_to_unit(phase: u32) -> f32 {
    (f64::from(phase) / PHASE_SPAN) as f32
}

#[inline]
pub fn unit_to_phase(unit: f32) -> u32 {
    (f64::from(unit.clamp(0.0, 1.0)) * PHASE_SPAN).min(f64::from(u32::MAX)) as u32
}

/*
The Waveshaper
==============

Slope moves the peak of a rise/fall ramp:

    slope -1           slope 0            slope +1
    ╲                   ╱╲                       ╱
    │╲                 ╱  ╲                    ╱ │
    │  ╲             ╱      ╲                ╱   │
    │    ╲         ╱          ╲            ╱     │

Shape bends both segments:

    shape < 0   exponential   v^(1 + 3|shape|)         (slow start)
    shape = 0   linear
    shape > 0   logarithmic   1 - (1 - v)^(1 + 3 shape)  (fast start)
*/

const PEAK_SPAN: f32 = 0.48;
const CURVE_DEPTH: f32 = 3.0;

/// Waveshape derived once per block from slope and shape.
#[derive(Debug, Clone, Copy)]
pub struct Waveshape {
    /// Phase (0..1) of the peak.
    peak: f32,
    /// Exponent applied by the bend.
    exponent: f32,
    logarithmic: bool,
}

impl Waveshape {
    pub fn new(shape: i16, slope: i16) -> Self {
        let shape = parameter_to_unit(shape);
        let slope = parameter_to_unit(slope);
        Self {
            peak: 0.5 + PEAK_SPAN * slope,
            exponent: 1.0 + CURVE_DEPTH * shape.abs(),
            logarithmic: shape > 0.0,
        }
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn peak_phase(&self) -> u32 {
        unit_to_phase(self.peak)
    }

    /// Linear ramp position at `phase` and whether it is past the peak.
    #[inline]
    pub fn ramp(&self, phase: u32) -> (f32, bool) {
        let p = phase_to_unit(phase);
        if p < self.peak {
            (p / self.peak, false)
        } else {
            (1.0 - (p - self.peak) / (1.0 - self.peak), true)
        }
    }

    /// Apply the bend to a linear ramp value.
    #[inline]
    pub fn bend(&self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        if self.exponent == 1.0 {
            v
        } else if self.logarithmic {
            1.0 - (1.0 - v).powf(self.exponent)
        } else {
            v.powf(self.exponent)
        }
    }

    /// Shaped value (0..1) at `phase` and whether it is past the peak.
    #[inline]
    pub fn evaluate(&self, phase: u32) -> (f32, bool) {
        let (ramp, falling) = self.ramp(phase);
        (self.bend(ramp), falling)
    }

    /// Phase in the falling segment that has the same linear level as
    /// the rising-segment `phase`.
    pub fn mirror_to_fall(&self, phase: u32) -> u32 {
        let (ramp, falling) = self.ramp(phase);
        if falling {
            return phase;
        }
        unit_to_phase(self.peak + (1.0 - ramp) * (1.0 - self.peak))
    }
}

/// Convert a value in 0..1 to fixed-point unipolar and bipolar samples.
#[inline]
pub fn to_fixed(value: f32) -> (u16, i16) {
    let value = value.clamp(0.0, 1.0);
    let unipolar = (value * 65_535.0) as u16;
    let bipolar = ((2.0 * value - 1.0) * 32_767.0) as i16;
    (unipolar, bipolar)
}
