//! Status bar: audio format, rate policy, envelope, keyboard octave

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use saavy_grain::{dsp::EnvelopeParams, synth::RatePolicy};

use super::state::UiInit;

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    init: &UiInit,
    envelope: &EnvelopeParams,
    octave: i8,
) {
    let block = Block::default().title(" grain ").borders(Borders::ALL);

    let rate = match init.rate {
        RatePolicy::Fixed(rate) => format!("rate {rate:.2}x"),
        RatePolicy::KeyTracked { root_note, rate_at_root } => {
            format!("rate {rate_at_root:.2}x @ {root_note}")
        }
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {:.1}kHz {}ch  ", init.sample_rate / 1000.0, init.channels),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "buffer {:.2}s  ",
                init.buffer_frames as f32 / init.sample_rate
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{rate}  "), Style::default().fg(Color::Yellow)),
        Span::styled(
            format!(
                "A {:.0}ms R {:.0}ms  ",
                envelope.attack * 1000.0,
                envelope.release * 1000.0
            ),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(format!("octave {octave}"), Style::default().fg(Color::White)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
