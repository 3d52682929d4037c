//! Real-world scenario benchmarks.
//!
//! These model the audio callback: a pool of voices reading one shared
//! recorder, and the full engine path including ingestion.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
