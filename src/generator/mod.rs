//! Buffered multi-mode generator core.

/*
Block Rendering
===============

Computing a sample of the generator is much more expensive than reading
one from memory, so the core renders ahead in fixed-size blocks and the
per-sample path only copies.

    input_blocks   [ ctl ctl ctl ... ] [ ctl ctl ctl ... ]      NUM_BLOCKS
    output_blocks  [ smp smp smp ... ] [ smp smp smp ... ]      x BLOCK_SIZE
                     ↑ render_block      ↑ playback_block

`process(control)` runs every sample:

  1. store `control` into input_blocks[playback][current]
  2. return output_blocks[playback][current]
  3. advance `current`; after BLOCK_SIZE samples advance `playback`

`render_pending()` runs once per block period:

  while render != playback:
      render output_blocks[render] from input_blocks[render]
      render = (render + 1) % NUM_BLOCKS

So the control bytes captured while block k was playing are rendered
into block k, which plays again NUM_BLOCKS - 1 blocks later. This costs
one block of latency and guarantees playback only ever reads blocks that
were completely rendered.

Strategies
----------

  wavetable override   → WavetableRenderer
  range == High        → audio-rate oscillator   ─┐
  otherwise            → control-rate envelope   ─┴→ smoothing pass
*/

mod oscillator;
pub mod shape;
mod smoothing;
mod wavetable;

use self::{oscillator::RampCore, smoothing::SmoothingPass, wavetable::WavetableRenderer};

/// Samples per rendered block.
pub const BLOCK_SIZE: usize = 16;
/// Blocks in the ring.
pub const NUM_BLOCKS: usize = 2;
/// Rate the core is tuned for. Hosts compensate pitch for other rates.
pub const NOMINAL_SAMPLE_RATE: f32 = 48_000.0;

/// What happens on a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorMode {
    /// One attack/decay cycle per trigger.
    Ad = 0,
    /// Free-running.
    #[default]
    Looping = 1,
    /// Attack while the gate is high, release when it falls.
    Ar = 2,
}

/// Frequency range and, through it, the rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorRange {
    /// Audio-rate oscillator.
    High = 0,
    #[default]
    Medium = 1,
    /// Slow control-rate envelopes.
    Low = 2,
}

macro_rules! cyclic_enum {
    ($name:ident, [$($variant:ident),+]) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const COUNT: usize = Self::ALL.len();

            pub fn index(self) -> usize {
                self as usize
            }

            /// Out-of-range values clamp to the nearest variant.
            pub fn from_index(index: i64) -> Self {
                let clamped = index.clamp(0, Self::COUNT as i64 - 1) as usize;
                Self::ALL[clamped]
            }

            pub fn previous(self) -> Self {
                Self::ALL[(self.index() + Self::COUNT - 1) % Self::COUNT]
            }

            pub fn next(self) -> Self {
                Self::ALL[(self.index() + 1) % Self::COUNT]
            }
        }
    };
}

cyclic_enum!(GeneratorMode, [Ad, Looping, Ar]);
cyclic_enum!(GeneratorRange, [High, Medium, Low]);

/// Per-sample control bits: gate states plus derived edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlByte(pub u8);

impl ControlByte {
    pub const FREEZE: u8 = 1 << 0;
    pub const GATE: u8 = 1 << 1;
    pub const CLOCK: u8 = 1 << 2;
    pub const CLOCK_RISING: u8 = 1 << 3;
    pub const GATE_RISING: u8 = 1 << 4;
    pub const GATE_FALLING: u8 = 1 << 5;

    #[inline]
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

/// One rendered sample in fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorSample {
    pub unipolar: u16,
    pub bipolar: i16,
    pub flags: u8,
}

impl GeneratorSample {
    pub const END_OF_ATTACK: u8 = 1 << 0;
    pub const END_OF_RELEASE: u8 = 1 << 1;

    pub fn end_of_attack(&self) -> bool {
        self.flags & Self::END_OF_ATTACK != 0
    }

    pub fn end_of_release(&self) -> bool {
        self.flags & Self::END_OF_RELEASE != 0
    }
}

/// Continuous parameters in fixed point (see `dsp::fixed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorParams {
    /// 1/128 semitone units; 7680 = 60 semitones.
    pub pitch: i16,
    pub shape: i16,
    pub slope: i16,
    pub smoothness: i16,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            pitch: 60 << 7,
            shape: 0,
            slope: 0,
            smoothness: 0,
        }
    }
}

pub struct Generator {
    mode: GeneratorMode,
    range: GeneratorRange,
    sync: bool,
    wavetable_override: bool,
    params: GeneratorParams,

    input_blocks: [[ControlByte; BLOCK_SIZE]; NUM_BLOCKS],
    output_blocks: [[GeneratorSample; BLOCK_SIZE]; NUM_BLOCKS],
    render_block: usize,
    playback_block: usize,
    current_sample: usize,

    core: RampCore,
    smoothing: SmoothingPass,
    wavetable: WavetableRenderer,
}

impl Generator {
    /// Allocates the wavetable bank; build this off the audio thread.
    pub fn new() -> Self {
        Self {
            mode: GeneratorMode::default(),
            range: GeneratorRange::default(),
            sync: false,
            wavetable_override: false,
            params: GeneratorParams::default(),

            input_blocks: [[ControlByte::default(); BLOCK_SIZE]; NUM_BLOCKS],
            output_blocks: [[GeneratorSample::default(); BLOCK_SIZE]; NUM_BLOCKS],
            render_block: 0,
            playback_block: NUM_BLOCKS / 2,
            current_sample: 0,

            core: RampCore::new(),
            smoothing: SmoothingPass::new(),
            wavetable: WavetableRenderer::new(),
        }
    }

    /// Store this sample's control byte and return the pre-rendered output.
    #[inline]
    pub fn process(&mut self, control: ControlByte) -> GeneratorSample {
        self.input_blocks[self.playback_block][self.current_sample] = control;
        let sample = self.output_blocks[self.playback_block][self.current_sample];

        self.current_sample += 1;
        if self.current_sample >= BLOCK_SIZE {
            self.current_sample = 0;
            self.playback_block = (self.playback_block + 1) % NUM_BLOCKS;
        }
        sample
    }

    /// Render blocks until the render cursor has caught up with playback.
    pub fn render_pending(&mut self) {
        while self.render_block != self.playback_block {
            let index = self.render_block;
            let input = &self.input_blocks[index][..];
            let output = &mut self.output_blocks[index][..];

            if self.wavetable_override {
                self.wavetable.render(&self.params, self.range, input, output);
            } else {
                let increment = match self.range {
                    GeneratorRange::High => {
                        self.core.render_audio_rate(&self.params, self.sync, input, output)
                    }
                    _ => self.core.render_control_rate(
                        &self.params,
                        self.mode,
                        self.range,
                        self.sync,
                        input,
                        output,
                    ),
                };
                self.smoothing.process(self.params.smoothness, increment, &mut *output);
            }

            self.render_block = (index + 1) % NUM_BLOCKS;
        }
    }

    /// Blocks played back but not yet re-rendered.
    pub fn pending_blocks(&self) -> usize {
        (self.playback_block + NUM_BLOCKS - self.render_block) % NUM_BLOCKS
    }

    pub fn render_block(&self) -> usize {
        self.render_block
    }

    pub fn playback_block(&self) -> usize {
        self.playback_block
    }

    pub fn mode(&self) -> GeneratorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GeneratorMode) {
        self.mode = mode;
    }

    pub fn range(&self) -> GeneratorRange {
        self.range
    }

    pub fn set_range(&mut self, range: GeneratorRange) {
        self.range = range;
    }

    pub fn sync(&self) -> bool {
        self.sync
    }

    pub fn set_sync(&mut self, sync: bool) {
        self.sync = sync;
    }

    pub fn wavetable_override(&self) -> bool {
        self.wavetable_override
    }

    pub fn set_wavetable_override(&mut self, enabled: bool) {
        self.wavetable_override = enabled;
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    pub fn set_pitch(&mut self, pitch: i16) {
        self.params.pitch = pitch;
    }

    pub fn set_shape(&mut self, shape: i16) {
        self.params.shape = shape;
    }

    pub fn set_slope(&mut self, slope: i16) {
        self.params.slope = slope;
    }

    pub fn set_smoothness(&mut self, smoothness: i16) {
        self.params.smoothness = smoothness;
    }

    /// Clear rendered audio and renderer state. Mode and range are kept.
    pub fn reset(&mut self) {
        self.input_blocks = [[ControlByte::default(); BLOCK_SIZE]; NUM_BLOCKS];
        self.output_blocks = [[GeneratorSample::default(); BLOCK_SIZE]; NUM_BLOCKS];
        self.render_block = 0;
        self.playback_block = NUM_BLOCKS / 2;
        self.current_sample = 0;
        self.core.reset();
        self.smoothing.reset();
        self.wavetable.reset();
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
