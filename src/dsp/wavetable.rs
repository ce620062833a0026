//! Band-limited single-cycle wavetable bank.

use rustfft::{num_complex::Complex, FftPlanner};

/*
Building Waves from Spectra
===========================

Each wave is described by its harmonic amplitudes (a sine series). The
bank fills an FFT buffer with those amplitudes and runs an INVERSE FFT to
get one cycle in the time domain:

    spectrum:  bin n  = -i · a_n / 2      (sine component of harmonic n)
               bin N-n = +i · a_n / 2     (its mirror, keeps output real)

    inverse FFT → x[k] = Σ a_n · sin(2π n k / N)

Because only harmonics up to MAX_HARMONIC are set, every table is band
limited by construction. Each table is normalized to a peak of 1.0 and
stores one guard sample (a copy of x[0]) so interpolation at the end of
the cycle never has to wrap.

Building the bank allocates and plans an FFT, so it happens once when a
generator is constructed, never on the audio thread.
*/

pub const TABLE_BITS: u32 = 8;
pub const TABLE_SIZE: usize = 1 << TABLE_BITS;
pub const WAVE_COUNT: usize = 8;
const MAX_HARMONIC: usize = 48;

pub struct WavetableBank {
    tables: Vec<[f32; TABLE_SIZE + 1]>,
}

impl WavetableBank {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let ifft = planner.plan_fft_inverse(TABLE_SIZE);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); TABLE_SIZE];

        let tables = (0..WAVE_COUNT)
            .map(|wave| {
                buffer.fill(Complex::new(0.0, 0.0));
                for harmonic in 1..=MAX_HARMONIC {
                    let amplitude = harmonic_amplitude(wave, harmonic);
                    if amplitude == 0.0 {
                        continue;
                    }
                    buffer[harmonic] = Complex::new(0.0, -0.5 * amplitude);
                    buffer[TABLE_SIZE - harmonic] = Complex::new(0.0, 0.5 * amplitude);
                }
                ifft.process(&mut buffer);

                let peak = buffer
                    .iter()
                    .fold(0.0f32, |acc, c| acc.max(c.re.abs()))
                    .max(1e-9);

                let mut table = [0.0f32; TABLE_SIZE + 1];
                for (slot, bin) in table.iter_mut().zip(buffer.iter()) {
                    *slot = bin.re / peak;
                }
                table[TABLE_SIZE] = table[0];
                table
            })
            .collect();

        Self { tables }
    }

    /// Read the bank at `phase` (full u32 range = one cycle) and a
    /// continuous `position` across waves (0.0 ..= WAVE_COUNT - 1).
    #[inline]
    pub fn sample(&self, position: f32, phase: u32) -> f32 {
        let position = position.clamp(0.0, (WAVE_COUNT - 1) as f32);
        let index = (position as usize).min(WAVE_COUNT - 2);
        let blend = position - index as f32;

        let a = read_table(&self.tables[index], phase);
        let b = read_table(&self.tables[index + 1], phase);
        a + (b - a) * blend
    }
}

impl Default for WavetableBank {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn read_table(table: &[f32; TABLE_SIZE + 1], phase: u32) -> f32 {
    let index = (phase >> (32 - TABLE_BITS)) as usize;
    let fraction = (phase << TABLE_BITS) as f32 / 4_294_967_296.0;
    let a = table[index];
    let b = table[index + 1];
    a + (b - a) * fraction
}

/// Harmonic recipe for each wave, ordered from pure to bright.
fn harmonic_amplitude(wave: usize, n: usize) -> f32 {
    let nf = n as f32;
    let odd = n % 2 == 1;
    match wave {
        // sine
        0 => (n == 1) as u8 as f32,
        // triangle
        1 if odd => {
            let sign = if (n / 2) % 2 == 0 { 1.0 } else { -1.0 };
            sign / (nf * nf)
        }
        // sine + octave
        2 => match n {
            1 => 1.0,
            2 => 0.5,
            _ => 0.0,
        },
        // square
        3 if odd => 1.0 / nf,
        // saw
        4 => 1.0 / nf,
        // 25% pulse
        5 => (std::f32::consts::PI * nf * 0.25).sin().abs() / nf,
        // formant bump around the 6th harmonic
        6 => (-(nf - 6.0) * (nf - 6.0) / 8.0).exp() + 0.3 / nf,
        // bright odd partials
        7 if odd => 1.0 / nf.sqrt(),
        _ => 0.0,
    }
}
