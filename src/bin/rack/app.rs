//! Rack - audio setup and the per-sample patch between the two modules
//!
//!     clock ──► bernoulli ch1 ──A──► generator TRIG
//!                          └──B──► bernoulli ch2
//!
//! The generator's bipolar output goes to the sound card.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use std::path::PathBuf;
use tracing::{error, info, warn};

use bernoulli_tides::{
    modules::{
        bernoulli::{BernoulliInputs, CHANNELS},
        envelope::EnvelopeInputs,
        message::drain,
    },
    patch::RackPatch,
    BernoulliGate, BufferedEnvelopeGenerator, Input, Module, ModuleMessage, ProcessCtx,
};

use super::ui::{
    state::{Button, ControlMessage, PanelState, ScopeFrame, UiStateInit},
    UiApp, VIS_BUFFER_SIZE,
};

const SHORT_PRESS_SECONDS: f32 = 0.05;
const LONG_PRESS_SECONDS: f32 = 1.2;
/// Panel snapshots per second
const PANEL_RATE: f32 = 30.0;
const OUTPUT_GAIN: f32 = 0.2;

/// Square-wave clock, 10 V high for half of each beat.
struct PulseClock {
    phase: f32,
    increment: f32,
}

impl PulseClock {
    fn new(bpm: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            increment: bpm / 60.0 / sample_rate,
        }
    }

    fn next_sample(&mut self) -> f32 {
        self.phase = (self.phase + self.increment).fract();
        if self.phase < 0.5 {
            10.0
        } else {
            0.0
        }
    }
}

/// Counts down how long a keyboard "press" holds a panel button.
#[derive(Default)]
struct HeldButtons {
    bernoulli: [u32; CHANNELS],
    mode: u32,
    range: u32,
}

impl HeldButtons {
    fn press(&mut self, button: Button, sample_rate: f32) {
        let samples = |seconds: f32| (seconds * sample_rate) as u32;
        match button {
            Button::Bernoulli { channel, long } => {
                if let Some(held) = self.bernoulli.get_mut(channel) {
                    *held = samples(if long { LONG_PRESS_SECONDS } else { SHORT_PRESS_SECONDS });
                }
            }
            Button::Mode => self.mode = samples(SHORT_PRESS_SECONDS),
            Button::Range => self.range = samples(SHORT_PRESS_SECONDS),
        }
    }

    fn tick(held: &mut u32) -> bool {
        let pressed = *held > 0;
        *held = held.saturating_sub(1);
        pressed
    }
}

/// Everything the audio callback owns.
struct RackEngine {
    gate: BernoulliGate,
    generator: BufferedEnvelopeGenerator,
    ctx: ProcessCtx,
    clock: PulseClock,
    held: HeldButtons,
    bernoulli_inputs: BernoulliInputs,
    envelope_inputs: EnvelopeInputs,
    panel: PanelState,
    panel_countdown: u32,
    panel_interval: u32,
}

impl RackEngine {
    fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::Press(button) => self.held.press(button, self.ctx.sample_rate),
            ControlMessage::Frequency(semitones) => self.envelope_inputs.frequency = semitones,
            ControlMessage::Threshold { channel, value } => {
                if let Some(inputs) = self.bernoulli_inputs.channels.get_mut(channel) {
                    inputs.threshold = value;
                }
            }
        }
    }

    /// Run both modules for one sample. Returns the scope frame.
    fn tick(&mut self) -> ScopeFrame {
        let clock = self.clock.next_sample();

        for (i, held) in self.held.bernoulli.iter_mut().enumerate() {
            self.bernoulli_inputs.channels[i].button = HeldButtons::tick(held);
        }
        self.bernoulli_inputs.channels[0].input = Input::patched(clock);
        let bernoulli = self.gate.process(&self.bernoulli_inputs, &self.ctx);
        // Feeds the second channel on the next sample.
        self.bernoulli_inputs.channels[1].input = Input::patched(bernoulli.channels[0].b);

        let button = |held: &mut u32| if HeldButtons::tick(held) { 1.0 } else { 0.0 };
        self.envelope_inputs.mode_button = button(&mut self.held.mode);
        self.envelope_inputs.range_button = button(&mut self.held.range);
        self.envelope_inputs.trigger = Input::patched(bernoulli.channels[0].a);
        let envelope = self.generator.process(&self.envelope_inputs, &self.ctx);

        self.panel.clock_high = clock > 0.0;
        self.panel.channels = bernoulli.channels;
        self.panel.envelope = envelope;

        ScopeFrame {
            unipolar: envelope.unipolar,
            bipolar: envelope.bipolar,
        }
    }

    /// A fresh panel snapshot, once every `panel_interval` samples.
    fn panel_due(&mut self) -> Option<PanelState> {
        self.panel_countdown = self.panel_countdown.saturating_sub(1);
        if self.panel_countdown > 0 {
            return None;
        }
        self.panel_countdown = self.panel_interval;
        self.panel.generator = self.generator.persisted();
        self.panel.wavetable = self.generator.wavetable();
        Some(self.panel)
    }
}

/// Main application builder
pub struct Rack {
    patch_path: Option<PathBuf>,
    wavetable: bool,
    clock_bpm: f32,
    seed: Option<u64>,
    threshold: f32,
}

impl Rack {
    pub fn new() -> Self {
        Self {
            patch_path: None,
            wavetable: false,
            clock_bpm: 120.0,
            seed: None,
            threshold: 0.5,
        }
    }

    /// Patch file loaded at start and written on quit
    pub fn patch(mut self, path: Option<PathBuf>) -> Self {
        self.patch_path = path;
        self
    }

    pub fn wavetable(mut self, enabled: bool) -> Self {
        self.wavetable = enabled;
        self
    }

    pub fn clock_bpm(mut self, bpm: f32) -> Self {
        self.clock_bpm = bpm;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    fn build_modules(
        &self,
        sample_rate: f32,
    ) -> EyreResult<(BernoulliGate, BufferedEnvelopeGenerator)> {
        let mut gate = match self.seed {
            Some(seed) => BernoulliGate::new().with_seed(seed),
            None => BernoulliGate::new(),
        };
        let mut generator =
            BufferedEnvelopeGenerator::new(sample_rate).with_wavetable(self.wavetable);

        if let Some(path) = self.patch_path.as_deref().filter(|p| p.exists()) {
            let patch = RackPatch::load(path).wrap_err("failed to load patch")?;
            patch
                .apply(&mut gate, &mut generator)
                .wrap_err("failed to apply patch")?;
            info!(path = %path.display(), "patch loaded");
        }
        Ok((gate, generator))
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(sample_rate, channels, "audio device ready");

        let (gate, generator) = self.build_modules(sample_rate)?;
        let mut bernoulli_inputs = BernoulliInputs::default();
        for channel in &mut bernoulli_inputs.channels {
            channel.threshold = self.threshold;
        }
        let panel_interval = (sample_rate / PANEL_RATE).max(1.0) as u32;
        let mut engine = RackEngine {
            gate,
            generator,
            ctx: ProcessCtx::new(sample_rate),
            clock: PulseClock::new(self.clock_bpm, sample_rate),
            held: HeldButtons::default(),
            bernoulli_inputs,
            envelope_inputs: EnvelopeInputs::default(),
            panel: PanelState::default(),
            panel_countdown: 1,
            panel_interval,
        };

        let (scope_tx, scope_rx) = RingBuffer::<ScopeFrame>::new(VIS_BUFFER_SIZE * 4);
        let (panel_tx, panel_rx) = RingBuffer::<PanelState>::new(8);
        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(64);
        let (module_tx, module_rx) = RingBuffer::<ModuleMessage>::new(64);

        let mut audio = AudioSide {
            scope_tx,
            panel_tx,
            control_rx,
            module_rx,
        };

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| audio.render(&mut engine, data, channels),
            |err| error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let init = UiStateInit {
            sample_rate,
            clock_bpm: self.clock_bpm,
            frequency: 0.0,
            thresholds: [self.threshold; CHANNELS],
        };
        let mut app = UiApp::new(init, scope_rx, panel_rx, control_tx, module_tx);
        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();
        drop(stream);

        let panel = result?;
        if let Some(path) = &self.patch_path {
            RackPatch::from_modes(&panel.bernoulli_modes(), &panel.generator)
                .save(path)
                .wrap_err("failed to save patch")?;
            info!(path = %path.display(), "patch saved");
        } else {
            warn!("no --patch given, modes not saved");
        }
        Ok(())
    }
}

impl Default for Rack {
    fn default() -> Self {
        Self::new()
    }
}

/// Ring-buffer ends owned by the audio callback
struct AudioSide {
    scope_tx: Producer<ScopeFrame>,
    panel_tx: Producer<PanelState>,
    control_rx: Consumer<ControlMessage>,
    module_rx: Consumer<ModuleMessage>,
}

impl AudioSide {
    fn render(&mut self, engine: &mut RackEngine, data: &mut [f32], channels: usize) {
        while let Ok(message) = self.control_rx.pop() {
            engine.handle(message);
        }
        drain(&mut self.module_rx, &mut engine.gate, &mut engine.generator);

        for frame in data.chunks_mut(channels.max(1)) {
            let scope = engine.tick();
            // The UI catches up from whatever is still queued.
            let _ = self.scope_tx.push(scope);
            if let Some(panel) = engine.panel_due() {
                let _ = self.panel_tx.push(panel);
            }

            let sample = scope.bipolar * OUTPUT_GAIN / 5.0;
            frame.fill(sample);
        }
    }
}
