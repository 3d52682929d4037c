//! Shared state types for UI communication
//!
//! Static data is handed over once at startup; per-block updates are `Copy`
//! so the audio thread can publish them without allocating.

use saavy_grain::{dsp::EnvelopeParams, synth::RatePolicy};

/// Voices shown in the meter panel
pub const MAX_UI_VOICES: usize = 16;

/// Static state captured at startup
#[derive(Clone, Debug)]
pub struct UiInit {
    pub sample_rate: f32,
    pub channels: usize,
    pub voices: usize,
    pub buffer_frames: usize,
    pub rate: RatePolicy,
    pub envelope: EnvelopeParams,
}

/// One voice as seen by the UI
#[derive(Clone, Copy, Debug, Default)]
pub struct VoiceMeter {
    pub active: bool,
    pub level: f32,
    pub note: u8,
}

/// Dynamic state sent from the audio thread after every block
#[derive(Clone, Copy, Debug, Default)]
pub struct UiUpdate {
    pub voices: [VoiceMeter; MAX_UI_VOICES],
    pub active_voices: u8,
}
