//! Low-level DSP primitives used by the grain voices.
//!
//! Everything here is allocation-free once configured and safe to call from
//! the audio callback. Allocation only happens in the `configure` methods,
//! which belong to the control path.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Floored wrap and linear interpolation helpers.
pub mod math;
/// Fixed-capacity circular recorder with fractional reads.
pub mod recorder;

pub use envelope::{Envelope, EnvelopeParams, EnvelopeStage};
pub use recorder::RingRecorder;
