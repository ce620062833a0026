//! Spectrum of the bipolar output
//!
//! Mostly useful in High range, where the generator runs at audio rate
//! and the smoothness knob adds or removes harmonics.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Log-spaced bands shown as bars
const BANDS: usize = 32;
const FLOOR_DB: f64 = -80.0;
const LOWEST_HZ: f64 = 20.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// FFT bin range `[start, end)` for every band
    bands: Vec<(usize, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    levels: Vec<f64>,
}

impl SpectrumAnalyzer {
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let buffer_len = buffer_len.max(2);
        let fft = FftPlanner::new().plan_fft_forward(buffer_len);

        let denom = (buffer_len - 1) as f32;
        let window = (0..buffer_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let half = buffer_len / 2;
        let nyquist = f64::from(sample_rate) / 2.0;
        let hz_per_bin = f64::from(sample_rate) / buffer_len as f64;
        let ratio = (nyquist / LOWEST_HZ).max(1.0);
        let edge = |band: usize| {
            let hz = LOWEST_HZ * ratio.powf(band as f64 / BANDS as f64);
            ((hz / hz_per_bin) as usize).clamp(1, half)
        };
        let bands = (0..BANDS)
            .map(|b| {
                let start = edge(b);
                (start, edge(b + 1).max(start + 1))
            })
            .collect();

        Self {
            window,
            bands,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            levels: vec![FLOOR_DB; BANDS],
        }
    }

    /// Recompute the band levels. Buffers of the wrong length are ignored.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }
        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = (self.window.len() as f32 / 2.0).powi(2);
        for (level, &(start, end)) in self.levels.iter_mut().zip(&self.bands) {
            let end = end.min(self.scratch.len());
            let power = self.scratch[start.min(end)..end]
                .iter()
                .map(|c| c.norm_sqr() / norm)
                .fold(0.0f32, f32::max)
                .max(1e-12);
            *level = (10.0 * f64::from(power).log10()).max(FLOOR_DB);
        }
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, levels: &[f64]) {
    let bars: Vec<Bar> = levels
        .iter()
        .map(|&db| Bar::default().value((db - FLOOR_DB).max(0.0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max(-FLOOR_DB as u64)
        .bar_style(Style::default().fg(Color::Green));

    frame.render_widget(chart, area);
}
