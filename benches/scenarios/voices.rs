//! Benchmarks for voice pools at different polyphony.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_grain::{
    dsp::{EnvelopeParams, RingRecorder},
    synth::{RatePolicy, Sound, VoicePool},
};

use crate::BLOCK_SIZES;

const POLYPHONY: &[usize] = &[1, 4, 16];

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let sample_rate = 48_000.0;

    let mut rec = RingRecorder::new(48_000);
    rec.configure(2, sample_rate, 48_000).unwrap();
    let noise: Vec<f32> = (0..48_000).map(|i| ((i * 7919) % 200) as f32 / 100.0 - 1.0).collect();
    rec.ingest(0, &noise);
    rec.ingest(1, &noise);

    for &size in BLOCK_SIZES {
        let mut out = vec![vec![0.0f32; size]; 2];

        for &voices in POLYPHONY {
            let mut pool = VoicePool::new(sample_rate, voices).unwrap();
            pool.prepare(sample_rate, size, 2).unwrap();
            pool.bind(&rec, 24_000);
            pool.set_envelope(EnvelopeParams::new(0.01, 0.0, 1.0, 0.05))
                .unwrap();
            pool.set_rate_policy(RatePolicy::KeyTracked {
                root_note: 60,
                rate_at_root: 1.0,
            })
            .unwrap();
            for note in 0..voices {
                pool.note_on(48 + note as u8 * 3, 100, &Sound::Granular);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("stereo_x{voices}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        pool.render_block(black_box(&rec), black_box(out.as_mut_slice()), &[], size);
                    })
                },
            );
        }
    }

    group.finish();
}
