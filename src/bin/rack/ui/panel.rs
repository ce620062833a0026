//! Front panel: modes, lights and gate outputs of both modules

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use bernoulli_tides::{GeneratorMode, GeneratorRange, OutMode, TossMode};

use super::state::{PanelState, UiStateInit};

/// Map a 0..1 brightness to a shade of `color`.
fn lamp(label: &str, brightness: f32, color: Color) -> Span<'static> {
    let style = if brightness > 0.5 {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else if brightness > 0.05 {
        Style::default().fg(color)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("● {label} "), style)
}

fn gate(volts: f32) -> Span<'static> {
    if volts > 0.5 {
        Span::styled(format!("{volts:>5.1}V "), Style::default().fg(Color::White))
    } else {
        Span::styled("  0.0V ", Style::default().fg(Color::DarkGray))
    }
}

fn toss_name(mode: TossMode) -> &'static str {
    match mode {
        TossMode::Direct => "direct",
        TossMode::Toggle => "toggle",
    }
}

fn out_name(mode: OutMode) -> &'static str {
    match mode {
        OutMode::Gate => "gate",
        OutMode::Latch => "latch",
        OutMode::Through => "through",
    }
}

fn mode_name(mode: GeneratorMode) -> &'static str {
    match mode {
        GeneratorMode::Ad => "AD",
        GeneratorMode::Looping => "looping",
        GeneratorMode::Ar => "AR",
    }
}

fn range_name(range: GeneratorRange) -> &'static str {
    match range {
        GeneratorRange::High => "high (audio)",
        GeneratorRange::Medium => "medium",
        GeneratorRange::Low => "low",
    }
}

pub fn render_panel(
    frame: &mut Frame,
    area: Rect,
    init: &UiStateInit,
    state: &PanelState,
    frequency: f32,
    thresholds: &[f32],
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = vec![Line::from(vec![
        Span::raw(format!(" clock {:.0} bpm ", init.clock_bpm)),
        lamp("", if state.clock_high { 1.0 } else { 0.0 }, Color::Red),
    ])];
    for (i, channel) in state.channels.iter().enumerate() {
        let threshold = thresholds.get(i).copied().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!(" ch{} ", i + 1), Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "{:<6} {:<7} p={threshold:.2}  ",
                toss_name(channel.toss_mode),
                out_name(channel.out_mode)
            )),
            lamp("A", channel.light_a, Color::Green),
            gate(channel.a),
            lamp("B", channel.light_b, Color::Red),
            gate(channel.b),
        ]));
    }
    let bernoulli = Paragraph::new(lines)
        .block(Block::default().title(" Bernoulli ").borders(Borders::ALL));
    frame.render_widget(bernoulli, columns[0]);

    let env = &state.envelope;
    let polarity_color = if env.polarity_light < 0.0 { Color::Red } else { Color::Green };
    let lines = vec![
        Line::from(vec![
            Span::raw(format!(
                " mode {:<8} range {:<13}",
                mode_name(state.generator.mode),
                range_name(state.generator.range)
            )),
            Span::styled(
                if state.wavetable { "wavetable" } else { "" },
                Style::default().fg(Color::Magenta),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!(" freq {frequency:+.0} st  ")),
            lamp("", env.polarity_light.abs(), polarity_color),
            Span::raw(format!("uni {:>4.1}V  bi {:>+5.1}V", env.unipolar, env.bipolar)),
        ]),
        Line::from(vec![
            Span::raw(" "),
            lamp("EOA", if env.high > 0.0 { 0.0 } else { 1.0 }, Color::Yellow),
            lamp("EOR", if env.low > 0.0 { 0.0 } else { 1.0 }, Color::Yellow),
        ]),
    ];
    let generator = Paragraph::new(lines)
        .block(Block::default().title(" Generator ").borders(Borders::ALL));
    frame.render_widget(generator, columns[1]);
}
