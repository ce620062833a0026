//! Shared state types for UI communication
//!
//! Everything crossing the audio boundary is `Copy` so the callback never
//! allocates.

use bernoulli_tides::modules::{
    bernoulli::{BernoulliModes, ChannelOutputs, CHANNELS},
    envelope::{EnvelopeOutputs, GeneratorModes},
};

/// Front-panel button pressed from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    /// Bernoulli channel button, held short or long.
    Bernoulli { channel: usize, long: bool },
    Mode,
    Range,
}

/// Commands sent from UI thread to audio thread
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlMessage {
    Press(Button),
    /// Frequency knob in semitones.
    Frequency(f32),
    /// Threshold knob of a Bernoulli channel.
    Threshold { channel: usize, value: f32 },
}

/// One sample of the generator outputs for the scope.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeFrame {
    pub unipolar: f32,
    pub bipolar: f32,
}

/// Static state sent once at initialization
#[derive(Clone, Debug)]
pub struct UiStateInit {
    pub sample_rate: f32,
    pub clock_bpm: f32,
    pub frequency: f32,
    pub thresholds: [f32; CHANNELS],
}

/// Panel snapshot sent from the audio thread a few times per second
#[derive(Clone, Copy, Debug, Default)]
pub struct PanelState {
    pub clock_high: bool,
    pub channels: [ChannelOutputs; CHANNELS],
    pub envelope: EnvelopeOutputs,
    pub generator: GeneratorModes,
    pub wavetable: bool,
}

impl PanelState {
    pub fn bernoulli_modes(&self) -> BernoulliModes {
        BernoulliModes {
            toss_modes: [self.channels[0].toss_mode, self.channels[1].toss_mode],
            out_modes: [self.channels[0].out_mode, self.channels[1].out_mode],
        }
    }
}
