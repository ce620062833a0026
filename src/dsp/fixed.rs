//! Fixed-point helpers and voltage rescaling.

/*
Fixed-Point Conventions
=======================

The generator core works on 16-bit integers, the way small embedded
synth firmware does. The host side works in volts. These helpers are the
only place the two meet.

  unipolar   u16, 0x0000 ..= 0xFFFF      (0 .. full scale)
  bipolar    i16, -0x8000 ..= 0x7FFF     (-full .. +full scale)
  level      u16 gain, 0xFFFF ≈ 1.0      (Q16: value / 2^16)
  parameter  i16, -0x7FFF ..= 0x7FFF     (knob -1.0 .. +1.0)
  pitch      i16, 1/128 semitone units   (60 semitones = 7680)

Scaling by a level is a 16x16 multiply followed by a shift:

    scaled = (sample * level) >> LEVEL_BITS

Products are formed in 32 bits, so nothing can overflow: the largest
magnitude is 0x8000 * 0xFFFF = 0x7FFF_8000, which fits in an i32. The
shift on signed values is arithmetic (rounds toward -infinity).
*/

/// Bits of fraction in a level gain.
pub const LEVEL_BITS: u32 = 16;
/// Bits of fraction per semitone in the pitch representation.
pub const PITCH_FRACTION_BITS: u32 = 7;
/// Pitch units per semitone.
pub const PITCH_UNITS_PER_SEMITONE: f32 = (1 << PITCH_FRACTION_BITS) as f32;

pub const UNIPOLAR_MAX: u16 = 0xFFFF;
pub const BIPOLAR_MIN: i16 = -0x8000;
pub const BIPOLAR_MAX: i16 = 0x7FFF;
/// Scale of a bipolar knob value in fixed point.
pub const PARAMETER_SCALE: f32 = 0x7FFF as f32;

/// Scale a unipolar sample by a Q16 level.
#[inline]
pub fn scale_unipolar(sample: u16, level: u16) -> u16 {
    ((u32::from(sample) * u32::from(level)) >> LEVEL_BITS) as u16
}

/// Scale a bipolar sample by a Q16 level, inverting its sign.
///
/// The inversion matches the output stage of the hardware, where the
/// bipolar signal passes through an inverting amplifier.
#[inline]
pub fn scale_bipolar_inverted(sample: i16, level: u16) -> i16 {
    let product = -i32::from(sample) * i32::from(level);
    (product >> LEVEL_BITS) as i16
}

/// Convert a level in 0.0..=1.0 to Q16, clamping out-of-range input.
#[inline]
pub fn level_from_unit(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * f32::from(UNIPOLAR_MAX)) as u16
}

/// Convert a knob value in -1.0..=1.0 to a fixed-point parameter.
///
/// The float-to-int cast truncates toward zero and saturates, so NaN maps
/// to 0 and the bounds map to ±0x7FFF.
#[inline]
pub fn parameter_from_unit(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * PARAMETER_SCALE) as i16
}

/// Convert a fixed-point parameter back to -1.0..=1.0.
#[inline]
pub fn parameter_to_unit(value: i16) -> f32 {
    (f32::from(value) / PARAMETER_SCALE).clamp(-1.0, 1.0)
}

/// Convert a pitch in semitones to 1/128-semitone fixed point, saturating.
#[inline]
pub fn pitch_from_semitones(semitones: f32) -> i16 {
    (semitones * PITCH_UNITS_PER_SEMITONE).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

#[inline]
pub fn pitch_to_semitones(pitch: i16) -> f32 {
    f32::from(pitch) / PITCH_UNITS_PER_SEMITONE
}

/// Linear map of `x` from `[x_min, x_max]` to `[y_min, y_max]`.
#[inline]
pub fn rescale(x: f32, x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> f32 {
    y_min + (x - x_min) / (x_max - x_min) * (y_max - y_min)
}

/// Unipolar fixed point to 0..=`full_scale` volts.
#[inline]
pub fn unipolar_to_volts(sample: u16, full_scale: f32) -> f32 {
    rescale(f32::from(sample), 0.0, f32::from(UNIPOLAR_MAX), 0.0, full_scale)
}

/// Bipolar fixed point to ±`full_scale` volts.
#[inline]
pub fn bipolar_to_volts(sample: i16, full_scale: f32) -> f32 {
    rescale(
        f32::from(sample),
        f32::from(BIPOLAR_MIN),
        f32::from(BIPOLAR_MAX),
        -full_scale,
        full_scale,
    )
}
