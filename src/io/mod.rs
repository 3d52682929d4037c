// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

pub use converter::{deinterleave, interleave, midi_to_event};
pub use midi::MidiEvent;

/// Planar input block, one `Vec` per channel.
#[derive(Debug, Default, Clone)]
pub struct AudioInput {
    pub buffers: Vec<Vec<f32>>,
}

/// Planar output block, one `Vec` per channel.
#[derive(Debug, Default, Clone)]
pub struct AudioOutput {
    pub buffers: Vec<Vec<f32>>,
}

impl AudioInput {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; channels],
        }
    }
}

impl AudioOutput {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; channels],
        }
    }
}
