#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::dsp::EnvelopeParams;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    AllNotesOff { allow_tail_off: bool },
    /// Reshape every voice's envelope. Ignored if nothing changed.
    SetEnvelope(EnvelopeParams),
}

/// A message scheduled at a frame offset inside the current block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoteEvent {
    pub offset: usize,
    pub message: SynthMessage,
}

impl NoteEvent {
    pub fn new(offset: usize, message: SynthMessage) -> Self {
        Self { offset, message }
    }

    pub fn note_on(offset: usize, note: u8, velocity: u8) -> Self {
        Self::new(offset, SynthMessage::NoteOn { note, velocity })
    }

    pub fn note_off(offset: usize, note: u8) -> Self {
        Self::new(offset, SynthMessage::NoteOff { note, velocity: 0 })
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
