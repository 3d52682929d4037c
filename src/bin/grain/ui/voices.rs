//! Per-voice envelope meters

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use super::state::UiUpdate;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[note as usize % 12], octave)
}

pub fn render_voices(frame: &mut Frame, area: Rect, update: &UiUpdate, voices: usize) {
    let block = Block::default()
        .title(format!(" Voices {}/{} ", update.active_voices, voices))
        .borders(Borders::ALL);

    let bars: Vec<Bar> = update
        .voices
        .iter()
        .take(voices)
        .map(|meter| {
            let label = if meter.active {
                note_name(meter.note)
            } else {
                "-".to_string()
            };
            let color = if meter.active { Color::LightGreen } else { Color::DarkGray };
            Bar::default()
                .value((meter.level * 100.0).round() as u64)
                .label(Line::from(label))
                .style(Style::default().fg(color))
                .text_value(String::new())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(3)
        .bar_gap(1)
        .max(100)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}
