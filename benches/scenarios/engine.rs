//! Benchmarks for the full engine block: ingest, events, render.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_grain::{synth::NoteEvent, EngineConfig, GranularEngine};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let config = EngineConfig {
            sample_rate: 48_000.0,
            max_block_size: size,
            buffer_frames: 48_000,
            ..EngineConfig::default()
        };
        let mut engine = GranularEngine::new(config).unwrap();

        let input: Vec<Vec<f32>> = (0..2)
            .map(|ch| (0..size).map(|i| ((i + ch) as f32 * 0.05).sin()).collect())
            .collect();
        let mut output = vec![vec![0.0f32; size]; 2];

        // Hold a full 16-voice chord
        let chord: Vec<NoteEvent> = (0..16).map(|i| NoteEvent::note_on(0, 48 + i * 2, 100)).collect();
        engine.process_block(input.as_slice(), output.as_mut_slice(), &chord);

        group.bench_with_input(BenchmarkId::new("sixteen_voices", size), &size, |b, _| {
            b.iter(|| {
                engine.process_block(black_box(input.as_slice()), black_box(output.as_mut_slice()), &[]);
            })
        });
    }

    group.finish();
}
