//! TUI module for grain
//!
//! Turns key presses into synth messages and draws what the audio thread
//! publishes: the output waveform and one envelope meter per voice.

pub mod state;
mod status;
mod voices;
mod waveform;

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

use saavy_grain::{dsp::EnvelopeParams, synth::SynthMessage};

pub use state::{UiInit, UiUpdate, VoiceMeter, MAX_UI_VOICES};

use status::render_status;
use voices::render_voices;
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;
/// Attack/release change per key press, in seconds
const ENVELOPE_STEP: f32 = 0.01;
const VELOCITY: u8 = 100;

/// Semitone offset from the keyboard octave's C for a piano-style key row.
fn key_offset(key: char) -> Option<u8> {
    let offset = match key {
        'a' => 0,
        'w' => 1,
        's' => 2,
        'e' => 3,
        'd' => 4,
        'f' => 5,
        't' => 6,
        'g' => 7,
        'y' => 8,
        'h' => 9,
        'u' => 10,
        'j' => 11,
        'k' => 12,
        _ => return None,
    };
    Some(offset)
}

pub struct UiApp {
    init: UiInit,
    msg_tx: Producer<SynthMessage>,
    audio_rx: Consumer<f32>,
    state_rx: Consumer<UiUpdate>,
    current_state: UiUpdate,
    audio_buffer: Vec<f32>,
    /// Terminals rarely report key releases, so keys latch notes on and off
    held: [bool; 128],
    octave: i8,
    envelope: EnvelopeParams,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        init: UiInit,
        msg_tx: Producer<SynthMessage>,
        audio_rx: Consumer<f32>,
        state_rx: Consumer<UiUpdate>,
    ) -> Self {
        let envelope = init.envelope;
        Self {
            init,
            msg_tx,
            audio_rx,
            state_rx,
            current_state: UiUpdate::default(),
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            held: [false; 128],
            octave: 4,
            envelope,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_state();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.send(SynthMessage::AllNotesOff {
            allow_tail_off: false,
        });
        Ok(())
    }

    fn poll_audio(&mut self) {
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
        }

        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn poll_state(&mut self) {
        while let Ok(state) = self.state_rx.pop() {
            self.current_state = state;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.held = [false; 128];
                self.send(SynthMessage::AllNotesOff {
                    allow_tail_off: true,
                });
            }
            KeyCode::Char('z') => self.octave = (self.octave - 1).max(0),
            KeyCode::Char('x') => self.octave = (self.octave + 1).min(8),
            KeyCode::Char('[') => self.nudge_envelope(-ENVELOPE_STEP, 0.0),
            KeyCode::Char(']') => self.nudge_envelope(ENVELOPE_STEP, 0.0),
            KeyCode::Char('-') => self.nudge_envelope(0.0, -ENVELOPE_STEP),
            KeyCode::Char('=') => self.nudge_envelope(0.0, ENVELOPE_STEP),
            KeyCode::Char(c) => {
                if let Some(offset) = key_offset(c) {
                    self.toggle_note(offset);
                }
            }
            _ => {}
        }
    }

    fn toggle_note(&mut self, offset: u8) {
        let note = (self.octave as u16 + 1) * 12 + offset as u16;
        let Ok(note) = u8::try_from(note) else {
            return;
        };
        if note > 127 {
            return;
        }

        let held = &mut self.held[note as usize];
        *held = !*held;
        let message = if *held {
            SynthMessage::NoteOn {
                note,
                velocity: VELOCITY,
            }
        } else {
            SynthMessage::NoteOff { note, velocity: 0 }
        };
        self.send(message);
    }

    fn nudge_envelope(&mut self, attack: f32, release: f32) {
        self.envelope.attack = (self.envelope.attack + attack).max(0.0);
        self.envelope.release = (self.envelope.release + release).max(0.0);
        self.send(SynthMessage::SetEnvelope(self.envelope));
    }

    fn send(&mut self, message: SynthMessage) {
        // A full queue means the audio thread has stalled; dropping is all we can do
        let _ = self.msg_tx.push(message);
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Voice meters
                Constraint::Length(8), // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        render_status(frame, chunks[0], &self.init, &self.envelope, self.octave);
        render_voices(frame, chunks[1], &self.current_state, self.init.voices);
        render_waveform(frame, chunks[2], &self.audio_buffer);

        let help = Paragraph::new(
            " [A-K] Notes  [Z/X] Octave  [ [ ] ] Attack  [-/=] Release  [Space] All off  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piano_row_covers_an_octave() {
        let offsets: Vec<u8> = "awsedftgyhujk".chars().filter_map(key_offset).collect();
        assert_eq!(offsets, (0..=12).collect::<Vec<u8>>());
        assert_eq!(key_offset('q'), None);
    }
}
