//! Benchmarks for ring recorder writes and interpolated reads.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_grain::dsp::RingRecorder;

use crate::BLOCK_SIZES;

pub fn bench_recorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/recorder");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // One second of stereo history; blocks regularly straddle the wrap point
        let mut rec = RingRecorder::new(48_000);
        rec.configure(2, 48_000.0, 48_000).unwrap();
        group.bench_with_input(BenchmarkId::new("ingest_stereo", size), &size, |b, _| {
            b.iter(|| {
                rec.ingest(0, black_box(&input));
                rec.ingest(1, black_box(&input));
            })
        });

        // Fractional cursor as used by a voice at 1.5x
        group.bench_with_input(BenchmarkId::new("read_interpolated", size), &size, |b, _| {
            b.iter(|| {
                let mut pos = 12_345.25f64;
                let mut sum = 0.0f32;
                for _ in 0..size {
                    sum += rec.read_interpolated(0, black_box(pos));
                    pos += 1.5;
                }
                sum
            })
        });
    }

    group.finish();
}
