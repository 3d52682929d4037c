//! Benchmarks for low-level DSP primitives.

mod envelope;
mod recorder;

pub use envelope::bench_envelope;
pub use recorder::bench_recorder;
