//! Two-channel stochastic gate router.

/*
Bernoulli Gate
==============

Each rising edge at the input flips a weighted coin and routes the event
to output A or B:

    in    ___╱‾‾‾╲______╱‾‾‾╲______╱‾‾‾╲___
    coin      A          B          A
    A     ___╱‾‾‾╲__________________╱‾‾‾╲___     Gate
    B     ______________╱‾‾‾╲_______________

Toss modes decide what the coin means:

  Direct   the coin picks the branch.
  Toggle   heads swaps the branch, tails keeps it.

Output modes decide what the outputs carry:

  Gate     10 V on the taken branch until the input falls.
  Latch    10 V on the taken branch until the next toss.
  Through  the input signal itself, routed to the taken branch.

A short press on the channel button cycles the toss mode, a long press
cycles the output mode.
*/

use super::{
    message::{MessageTarget, ModuleMessage},
    Module, ProcessCtx,
};
use crate::dsp::{
    light::LIGHT_DECAY_RATE, Edge, FastUniform, Light, Press, PressDetector, SchmittTrigger,
    UniformSource,
};
use crate::io::Input;

pub const CHANNELS: usize = 2;
/// Voltage of an open gate.
pub const GATE_VOLTS: f32 = 10.0;
/// Probability CV span: 10 V adds 1.0 to the threshold knob.
const PROBABILITY_CV_SCALE: f32 = 1.0 / 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TossMode {
    #[default]
    Direct = 0,
    Toggle = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutMode {
    #[default]
    Gate = 0,
    Latch = 1,
    Through = 2,
}

impl TossMode {
    pub const ALL: [TossMode; 2] = [TossMode::Direct, TossMode::Toggle];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Out-of-range values clamp to the nearest variant.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, Self::ALL.len() as i64 - 1) as usize]
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

impl OutMode {
    pub const ALL: [OutMode; 3] = [OutMode::Gate, OutMode::Latch, OutMode::Through];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Out-of-range values clamp to the nearest variant.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, Self::ALL.len() as i64 - 1) as usize]
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// Host values for one channel, one sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelInputs {
    pub input: Input,
    /// Threshold knob, 0..=1.
    pub threshold: f32,
    pub probability: Input,
    /// Mode button held down.
    pub button: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelOutputs {
    pub a: f32,
    pub b: f32,
    /// Brightness of the light for branch A.
    pub light_a: f32,
    /// Brightness of the light for branch B.
    pub light_b: f32,
    pub toss_mode: TossMode,
    pub out_mode: OutMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BernoulliInputs {
    pub channels: [ChannelInputs; CHANNELS],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BernoulliOutputs {
    pub channels: [ChannelOutputs; CHANNELS],
}

/// The persisted part of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BernoulliModes {
    pub toss_modes: [TossMode; CHANNELS],
    pub out_modes: [OutMode; CHANNELS],
}

#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    trigger: SchmittTrigger,
    button: PressDetector,
    toss_mode: TossMode,
    out_mode: OutMode,
    /// `false` routes to A, `true` to B.
    last_toss: bool,
    out_a: f32,
    out_b: f32,
    light_a: Light,
    light_b: Light,
}

impl Channel {
    fn process(
        &mut self,
        inputs: &ChannelInputs,
        sample_time: f32,
        source: &mut impl UniformSource,
    ) -> ChannelOutputs {
        match self.button.process(inputs.button, sample_time) {
            Press::Short => self.toss_mode = self.toss_mode.next(),
            Press::Long => self.out_mode = self.out_mode.next(),
            Press::None => {}
        }

        let input = inputs.input.voltage();
        match self.trigger.process(input) {
            Edge::Rising => {
                let r = source.uniform();
                let threshold = (inputs.threshold
                    + inputs.probability.voltage() * PROBABILITY_CV_SCALE)
                    .clamp(0.0, 1.0);
                self.toss(r < threshold);
            }
            Edge::Falling => {
                if self.out_mode == OutMode::Gate {
                    self.out_a = 0.0;
                    self.out_b = 0.0;
                }
            }
            Edge::None => {}
        }

        if self.out_mode == OutMode::Through {
            self.out_a = if self.last_toss { 0.0 } else { input };
            self.out_b = if self.last_toss { input } else { 0.0 };
        }

        if !(self.trigger.is_high() || self.out_mode == OutMode::Latch) {
            self.light_a.set_smooth(0.0, LIGHT_DECAY_RATE, sample_time);
            self.light_b.set_smooth(0.0, LIGHT_DECAY_RATE, sample_time);
        }

        ChannelOutputs {
            a: self.out_a,
            b: self.out_b,
            light_a: self.light_a.value(),
            light_b: self.light_b.value(),
            toss_mode: self.toss_mode,
            out_mode: self.out_mode,
        }
    }

    fn toss(&mut self, toss: bool) {
        self.last_toss = match self.toss_mode {
            TossMode::Direct => toss,
            TossMode::Toggle => self.last_toss ^ toss,
        };

        if matches!(self.out_mode, OutMode::Gate | OutMode::Latch) {
            self.out_a = if self.last_toss { 0.0 } else { GATE_VOLTS };
            self.out_b = if self.last_toss { GATE_VOLTS } else { 0.0 };
        }

        let (taken, other) = if self.last_toss {
            (&mut self.light_b, &mut self.light_a)
        } else {
            (&mut self.light_a, &mut self.light_b)
        };
        taken.set(1.0);
        if self.out_mode == OutMode::Latch {
            other.set(0.0);
        }
    }

    fn reset(&mut self) {
        self.trigger.reset();
        self.button.reset();
        self.toss_mode = TossMode::Direct;
        self.out_mode = OutMode::Gate;
        self.last_toss = false;
        self.out_a = 0.0;
        self.out_b = 0.0;
        self.light_a.set(0.0);
        self.light_b.set(0.0);
    }
}

pub struct BernoulliGate<R: UniformSource = FastUniform> {
    channels: [Channel; CHANNELS],
    source: R,
}

impl BernoulliGate<FastUniform> {
    /// Seeds the random source from OS entropy; build this off the audio thread.
    pub fn new() -> Self {
        Self::with_source(FastUniform::from_entropy())
    }

    /// Replace the random source with a reproducible one.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            channels: self.channels,
            source: FastUniform::seeded(seed),
        }
    }
}

impl Default for BernoulliGate<FastUniform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: UniformSource> BernoulliGate<R> {
    pub fn with_source(source: R) -> Self {
        Self {
            channels: [Channel::default(); CHANNELS],
            source,
        }
    }

    pub fn toss_mode(&self, channel: usize) -> Option<TossMode> {
        self.channels.get(channel).map(|c| c.toss_mode)
    }

    pub fn out_mode(&self, channel: usize) -> Option<OutMode> {
        self.channels.get(channel).map(|c| c.out_mode)
    }

    /// Which branch the last toss took on `channel` (`false` is A).
    pub fn last_toss(&self, channel: usize) -> Option<bool> {
        self.channels.get(channel).map(|c| c.last_toss)
    }

    /// Ignored for channels that do not exist.
    pub fn set_toss_mode(&mut self, channel: usize, mode: TossMode) {
        if let Some(c) = self.channels.get_mut(channel) {
            c.toss_mode = mode;
        }
    }

    /// Ignored for channels that do not exist.
    pub fn set_out_mode(&mut self, channel: usize, mode: OutMode) {
        if let Some(c) = self.channels.get_mut(channel) {
            c.out_mode = mode;
        }
    }

    pub fn persisted(&self) -> BernoulliModes {
        BernoulliModes {
            toss_modes: [self.channels[0].toss_mode, self.channels[1].toss_mode],
            out_modes: [self.channels[0].out_mode, self.channels[1].out_mode],
        }
    }

    pub fn restore(&mut self, modes: &BernoulliModes) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.toss_mode = modes.toss_modes[i];
            channel.out_mode = modes.out_modes[i];
        }
    }
}

impl<R: UniformSource> Module for BernoulliGate<R> {
    type Inputs = BernoulliInputs;
    type Outputs = BernoulliOutputs;

    fn process(&mut self, inputs: &BernoulliInputs, ctx: &ProcessCtx) -> BernoulliOutputs {
        let mut outputs = BernoulliOutputs::default();
        for (i, channel) in self.channels.iter_mut().enumerate() {
            outputs.channels[i] =
                channel.process(&inputs.channels[i], ctx.sample_time, &mut self.source);
        }
        outputs
    }

    /// Back to Direct / Gate with both channels routed to A.
    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}

impl<R: UniformSource> MessageTarget for BernoulliGate<R> {
    fn apply(&mut self, message: &ModuleMessage) {
        match *message {
            ModuleMessage::SetTossMode { channel, mode } => self.set_toss_mode(channel, mode),
            ModuleMessage::SetOutMode { channel, mode } => self.set_out_mode(channel, mode),
            ModuleMessage::ResetBernoulli => self.reset(),
            _ => {}
        }
    }
}
