//! Audio-rate and control-rate renderers sharing one phase accumulator.

use super::{
    shape::{increment_for_period, phase_increment, to_fixed, Waveshape},
    ControlByte, GeneratorMode, GeneratorParams, GeneratorRange, GeneratorSample,
};

/// Length of the end-of-release pulse at control rate (1 ms at 48 kHz).
const EOR_PULSE_SAMPLES: u32 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Resting at zero after a one-shot cycle.
    Idle,
    Running,
}

/// Measures the distance between clock edges for sync.
#[derive(Debug, Clone, Copy, Default)]
struct ClockSync {
    since_edge: u32,
    period: Option<u32>,
}

impl ClockSync {
    #[inline]
    fn tick(&mut self, rising: bool) {
        self.since_edge = self.since_edge.saturating_add(1);
        if rising {
            if self.since_edge > 1 {
                self.period = Some(self.since_edge);
            }
            self.since_edge = 0;
        }
    }

    fn increment(&self, enabled: bool) -> Option<u32> {
        if enabled {
            self.period.map(increment_for_period)
        } else {
            None
        }
    }
}

pub(super) struct RampCore {
    phase: u32,
    stage: Stage,
    eor_pulse: u32,
    sync: ClockSync,
}

impl RampCore {
    pub fn new() -> Self {
        Self {
            phase: 0,
            stage: Stage::Idle,
            eor_pulse: 0,
            sync: ClockSync::default(),
        }
    }

    /// Free-running oscillator. Returns the increment used for the block.
    pub fn render_audio_rate(
        &mut self,
        params: &GeneratorParams,
        sync: bool,
        input: &[ControlByte],
        output: &mut [GeneratorSample],
    ) -> u32 {
        let shape = Waveshape::new(params.shape, params.slope);
        let pitched = phase_increment(params.pitch, GeneratorRange::High);
        let mut increment = self.sync.increment(sync).unwrap_or(pitched);

        for (control, out) in input.iter().zip(output.iter_mut()) {
            let rising = control.has(ControlByte::GATE_RISING);
            self.sync.tick(control.has(ControlByte::CLOCK_RISING));
            if let Some(synced) = self.sync.increment(sync) {
                increment = synced;
            }

            let mut flags = 0;
            if rising {
                self.phase = 0;
            } else if !control.has(ControlByte::FREEZE) {
                let (next, wrapped) = self.phase.overflowing_add(increment);
                self.phase = next;
                if wrapped {
                    flags |= GeneratorSample::END_OF_RELEASE;
                }
            }

            let (value, falling) = shape.evaluate(self.phase);
            if falling {
                flags |= GeneratorSample::END_OF_ATTACK;
            }
            let (unipolar, bipolar) = to_fixed(value);
            *out = GeneratorSample {
                unipolar,
                bipolar,
                flags,
            };
        }
        self.stage = Stage::Running;
        increment
    }

    /// Envelope / LFO state machine. Returns the increment used for the block.
    pub fn render_control_rate(
        &mut self,
        params: &GeneratorParams,
        mode: GeneratorMode,
        range: GeneratorRange,
        sync: bool,
        input: &[ControlByte],
        output: &mut [GeneratorSample],
    ) -> u32 {
        let shape = Waveshape::new(params.shape, params.slope);
        let pitched = phase_increment(params.pitch, range);
        let mut increment = self.sync.increment(sync).unwrap_or(pitched);
        let peak_phase = shape.peak_phase();

        if mode == GeneratorMode::Looping {
            self.stage = Stage::Running;
        }

        for (control, out) in input.iter().zip(output.iter_mut()) {
            let rising = control.has(ControlByte::GATE_RISING);
            let gate = control.has(ControlByte::GATE);
            self.sync.tick(control.has(ControlByte::CLOCK_RISING));
            if let Some(synced) = self.sync.increment(sync) {
                increment = synced;
            }

            if rising {
                self.phase = 0;
                self.stage = Stage::Running;
            } else if self.stage == Stage::Running && !control.has(ControlByte::FREEZE) {
                self.advance(mode, gate, increment, peak_phase, &shape);
            }

            let mut flags = 0;
            let (value, falling) = match self.stage {
                Stage::Running => shape.evaluate(self.phase),
                Stage::Idle => (0.0, false),
            };
            if falling {
                flags |= GeneratorSample::END_OF_ATTACK;
            }
            if self.eor_pulse > 0 {
                self.eor_pulse -= 1;
                flags |= GeneratorSample::END_OF_RELEASE;
            }
            if self.stage == Stage::Idle {
                flags |= GeneratorSample::END_OF_RELEASE;
            }

            let (unipolar, bipolar) = to_fixed(value);
            *out = GeneratorSample {
                unipolar,
                bipolar,
                flags,
            };
        }
        increment
    }

    fn advance(
        &mut self,
        mode: GeneratorMode,
        gate: bool,
        increment: u32,
        peak_phase: u32,
        shape: &Waveshape,
    ) {
        if mode == GeneratorMode::Ar && self.phase <= peak_phase {
            if !gate {
                // Gate released during the attack: continue from the same
                // level on the falling segment.
                self.phase = shape.mirror_to_fall(self.phase);
            } else {
                // Hold at the peak while the gate stays high.
                self.phase = self.phase.saturating_add(increment).min(peak_phase);
                return;
            }
        }

        let (next, wrapped) = self.phase.overflowing_add(increment);
        if !wrapped {
            self.phase = next;
            return;
        }

        self.eor_pulse = EOR_PULSE_SAMPLES;
        match mode {
            GeneratorMode::Looping => self.phase = next,
            GeneratorMode::Ad | GeneratorMode::Ar => {
                self.phase = 0;
                self.stage = Stage::Idle;
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0;
        self.stage = Stage::Idle;
        self.eor_pulse = 0;
        self.sync = ClockSync::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::BLOCK_SIZE;

    fn controls(flags: &[(usize, u8)], base: u8) -> [ControlByte; BLOCK_SIZE] {
        let mut block = [ControlByte(base); BLOCK_SIZE];
        for &(index, flag) in flags {
            block[index].set(flag);
        }
        block
    }

    fn fast_params() -> GeneratorParams {
        // +48 semitones in Medium range: ~33 Hz, about 1450 samples per cycle.
        GeneratorParams {
            pitch: 108 << 7,
            ..GeneratorParams::default()
        }
    }

    fn render(
        core: &mut RampCore,
        mode: GeneratorMode,
        blocks: usize,
        mut control: impl FnMut(usize) -> [ControlByte; BLOCK_SIZE],
    ) -> Vec<GeneratorSample> {
        let params = fast_params();
        let mut out = Vec::new();
        for b in 0..blocks {
            let input = control(b);
            let mut block = [GeneratorSample::default(); BLOCK_SIZE];
            core.render_control_rate(
                &params,
                mode,
                GeneratorRange::Medium,
                false,
                &input,
                &mut block,
            );
            out.extend_from_slice(&block);
        }
        out
    }

    #[test]
    fn ad_waits_for_a_trigger() {
        let mut core = RampCore::new();
        let out = render(&mut core, GeneratorMode::Ad, 8, |_| controls(&[], 0));
        assert!(out.iter().all(|s| s.unipolar == 0 && s.end_of_release()));
    }

    #[test]
    fn ad_runs_one_cycle_then_rests() {
        let mut core = RampCore::new();
        let out = render(&mut core, GeneratorMode::Ad, 200, |b| {
            if b == 0 {
                controls(&[(0, ControlByte::GATE_RISING)], 0)
            } else {
                controls(&[], 0)
            }
        });

        let peak = out.iter().map(|s| s.unipolar).max().unwrap();
        assert!(peak > 0xF000, "attack never reached the top: {peak:#x}");
        let tail = &out[out.len() - BLOCK_SIZE..];
        assert!(tail.iter().all(|s| s.unipolar == 0 && s.end_of_release()));
    }

    #[test]
    fn ar_holds_peak_while_gate_high() {
        let mut core = RampCore::new();
        let out = render(&mut core, GeneratorMode::Ar, 150, |b| {
            if b == 0 {
                controls(&[(0, ControlByte::GATE_RISING)], ControlByte::GATE)
            } else {
                controls(&[], ControlByte::GATE)
            }
        });
        let tail = &out[out.len() - BLOCK_SIZE..];
        assert!(tail.iter().all(|s| s.unipolar > 0xFF00), "did not sustain at peak");
    }

    #[test]
    fn ar_releases_after_gate_falls() {
        let mut core = RampCore::new();
        let out = render(&mut core, GeneratorMode::Ar, 300, |b| match b {
            0 => controls(&[(0, ControlByte::GATE_RISING)], ControlByte::GATE),
            1..=99 => controls(&[], ControlByte::GATE),
            100 => controls(&[(0, ControlByte::GATE_FALLING)], 0),
            _ => controls(&[], 0),
        });
        assert!(out[100 * BLOCK_SIZE + 4].end_of_attack(), "release should be flagged");
        let tail = &out[out.len() - BLOCK_SIZE..];
        assert!(tail.iter().all(|s| s.unipolar == 0));
    }

    #[test]
    fn freeze_holds_the_phase() {
        let mut core = RampCore::new();
        let out = render(&mut core, GeneratorMode::Looping, 20, |b| {
            if b < 10 {
                controls(&[], 0)
            } else {
                controls(&[], ControlByte::FREEZE)
            }
        });
        let frozen = &out[11 * BLOCK_SIZE..];
        assert!(frozen.windows(2).all(|w| w[0].unipolar == w[1].unipolar));
    }

    #[test]
    fn looping_retriggers_from_zero() {
        let mut core = RampCore::new();
        let out = render(&mut core, GeneratorMode::Looping, 30, |b| {
            if b == 20 {
                controls(&[(3, ControlByte::GATE_RISING)], 0)
            } else {
                controls(&[], 0)
            }
        });
        assert_eq!(out[20 * BLOCK_SIZE + 3].unipolar, 0);
    }

    const CLOCK_EDGE: u8 = ControlByte::GATE_RISING | ControlByte::CLOCK_RISING;

    #[test]
    fn sync_follows_clock_period() {
        let mut core = RampCore::new();
        let params = fast_params();
        let mut last = 0;
        // Clock every 4 blocks (64 samples).
        for b in 0..40 {
            let input = if b % 4 == 0 {
                controls(&[(0, CLOCK_EDGE)], 0)
            } else {
                controls(&[], 0)
            };
            let mut block = [GeneratorSample::default(); BLOCK_SIZE];
            last = core.render_control_rate(
                &params,
                GeneratorMode::Looping,
                GeneratorRange::Medium,
                true,
                &input,
                &mut block,
            );
        }
        assert_eq!(last, increment_for_period(64));
    }

    #[test]
    fn trigger_edges_do_not_disturb_sync() {
        let params = fast_params();
        let mut control_core = RampCore::new();
        let mut audio_core = RampCore::new();
        let (mut control_rate, mut audio_rate) = (0, 0);
        // Clock every 64 samples, a bare trigger halfway between clocks.
        for b in 0..40 {
            let input = match b % 4 {
                0 => controls(&[(0, CLOCK_EDGE)], 0),
                2 => controls(&[(0, ControlByte::GATE_RISING)], 0),
                _ => controls(&[], 0),
            };
            let mut block = [GeneratorSample::default(); BLOCK_SIZE];
            control_rate = control_core.render_control_rate(
                &params,
                GeneratorMode::Looping,
                GeneratorRange::Medium,
                true,
                &input,
                &mut block,
            );
            audio_rate = audio_core.render_audio_rate(&params, true, &input, &mut block);
        }
        assert_eq!(control_rate, increment_for_period(64));
        assert_eq!(audio_rate, increment_for_period(64));
    }
}
