//! TUI for the rack demo
//!
//! Shows the panel lights, a scope of the generator outputs and the
//! spectrum of the bipolar output. Keys press the module buttons.

mod panel;
mod spectrum;
pub mod state;
mod waveform;

use bernoulli_tides::ModuleMessage;
use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::Duration;

use panel::render_panel;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use state::{Button, ControlMessage, PanelState, ScopeFrame, UiStateInit};
use waveform::render_scope;

/// Scope and FFT length
pub const VIS_BUFFER_SIZE: usize = 2048;
const FREQUENCY_RANGE: f32 = 48.0;
const THRESHOLD_STEP: f32 = 0.05;

pub struct UiApp {
    init: UiStateInit,
    scope_rx: Consumer<ScopeFrame>,
    panel_rx: Consumer<PanelState>,
    control_tx: Producer<ControlMessage>,
    module_tx: Producer<ModuleMessage>,
    panel: PanelState,
    scope: Vec<ScopeFrame>,
    bipolar: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    frequency: f32,
    thresholds: [f32; 2],
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        init: UiStateInit,
        scope_rx: Consumer<ScopeFrame>,
        panel_rx: Consumer<PanelState>,
        control_tx: Producer<ControlMessage>,
        module_tx: Producer<ModuleMessage>,
    ) -> Self {
        Self {
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, init.sample_rate),
            frequency: init.frequency,
            thresholds: init.thresholds,
            init,
            scope_rx,
            panel_rx,
            control_tx,
            module_tx,
            panel: PanelState::default(),
            scope: vec![ScopeFrame::default(); VIS_BUFFER_SIZE],
            bipolar: vec![0.0; VIS_BUFFER_SIZE],
            should_quit: false,
        }
    }

    /// Run until the user quits. Returns the last panel state seen.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<PanelState> {
        while !self.should_quit {
            self.poll_audio();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(self.panel)
    }

    fn poll_audio(&mut self) {
        let before = self.scope.len();
        while let Ok(frame) = self.scope_rx.pop() {
            self.scope.push(frame);
        }
        if self.scope.len() > before {
            let excess = self.scope.len().saturating_sub(VIS_BUFFER_SIZE);
            self.scope.drain(..excess);
            self.bipolar.clear();
            self.bipolar.extend(self.scope.iter().map(|f| f.bipolar / 5.0));
            self.spectrum.update(&self.bipolar);
        }

        while let Ok(panel) = self.panel_rx.pop() {
            self.panel = panel;
        }
    }

    fn send(&mut self, message: ControlMessage) {
        // A full queue only drops a key press.
        let _ = self.control_tx.push(message);
    }

    fn press_bernoulli(&mut self, channel: usize, long: bool) {
        self.send(ControlMessage::Press(Button::Bernoulli { channel, long }));
    }

    fn send_module(&mut self, message: ModuleMessage) {
        let _ = self.module_tx.push(message);
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('t') => self.press_bernoulli(0, false),
            KeyCode::Char('T') => self.press_bernoulli(0, true),
            KeyCode::Char('y') => self.press_bernoulli(1, false),
            KeyCode::Char('Y') => self.press_bernoulli(1, true),
            KeyCode::Char('m') => self.send(ControlMessage::Press(Button::Mode)),
            KeyCode::Char('r') => self.send(ControlMessage::Press(Button::Range)),
            KeyCode::Char('w') => {
                let enabled = !self.panel.wavetable;
                self.send_module(ModuleMessage::SetWavetable(enabled));
            }
            KeyCode::Char('x') => {
                self.send_module(ModuleMessage::ResetBernoulli);
                self.send_module(ModuleMessage::ResetGenerator);
            }
            KeyCode::Up | KeyCode::Down => {
                let step = if key == KeyCode::Up { 1.0 } else { -1.0 };
                self.frequency = (self.frequency + step).clamp(-FREQUENCY_RANGE, FREQUENCY_RANGE);
                self.send(ControlMessage::Frequency(self.frequency));
            }
            KeyCode::Left | KeyCode::Right => {
                let step = if key == KeyCode::Right { THRESHOLD_STEP } else { -THRESHOLD_STEP };
                let value = (self.thresholds[0] + step).clamp(0.0, 1.0);
                self.thresholds[0] = value;
                self.send(ControlMessage::Threshold { channel: 0, value });
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Panel
                Constraint::Min(8),    // Scope
                Constraint::Length(8), // Spectrum
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        render_panel(
            frame,
            chunks[0],
            &self.init,
            &self.panel,
            self.frequency,
            &self.thresholds,
        );
        render_scope(frame, chunks[1], &self.scope);
        render_spectrum(frame, chunks[2], self.spectrum.levels());

        let help = Paragraph::new(concat!(
            " [Q] Quit  [t/T y/Y] Bernoulli short/long  [M] Mode  [R] Range",
            "  [W] Wavetable  [X] Reset  [↑↓] Freq  [←→] Threshold",
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
