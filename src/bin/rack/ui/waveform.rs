//! Scope widget for the generator outputs

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::state::ScopeFrame;

/// Render both generator outputs in volts
pub fn render_scope(frame: &mut Frame, area: Rect, frames: &[ScopeFrame]) {
    let block = Block::default().title(" Scope ").borders(Borders::ALL);

    let len = frames.len().max(1) as f64;
    let unipolar: Vec<(f64, f64)> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| (i as f64 / len, f64::from(f.unipolar)))
        .collect();
    let bipolar: Vec<(f64, f64)> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| (i as f64 / len, f64::from(f.bipolar)))
        .collect();

    let datasets = vec![
        Dataset::default()
            .name("uni")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&unipolar),
        Dataset::default()
            .name("bi")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&bipolar),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-5.0, 8.0])
                .labels(vec!["-5V", "0V", "8V"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
