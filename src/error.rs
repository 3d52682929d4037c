//! Configuration error types.
//!
//! Only the control path can fail. Everything that runs inside the audio
//! callback (`ingest`, `tick`, `render`) is total over its inputs.

use thiserror::Error;

/// Errors raised while configuring the recorder, voices or engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The recorder and voices need at least one channel
    #[error("channel count must be at least 1, got {0}")]
    InvalidChannelCount(usize),

    /// Sample rate is zero, negative or not finite
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    /// Block size is zero
    #[error("block size must be at least 1 frame, got {0}")]
    InvalidBlockSize(usize),

    /// Voice pool would be empty
    #[error("voice count must be at least 1, got {0}")]
    InvalidVoiceCount(usize),

    /// An envelope stage was given a negative or non-finite duration
    #[error("{stage} time must be a finite, non-negative number of seconds, got {seconds}")]
    NegativeTime { stage: &'static str, seconds: f32 },

    /// Sustain level outside `[0, 1]`
    #[error("sustain level must be within [0, 1], got {0}")]
    SustainOutOfRange(f32),

    /// Playback rate is NaN or infinite
    #[error("playback rate must be finite, got {0}")]
    InvalidPlaybackRate(f64),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
