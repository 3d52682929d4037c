pub mod dsp; // Recorder, envelope, interpolation math
pub mod engine; // Host-facing processor
pub mod error;
pub mod io;
pub mod synth; // Grain voices and polyphony

pub use engine::{EngineConfig, GranularEngine};
pub use error::{ConfigError, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
