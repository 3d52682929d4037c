//! End-to-end recording and playback scenarios.

use approx::assert_abs_diff_eq;
use saavy_grain::{
    dsp::{EnvelopeParams, RingRecorder},
    synth::{GrainVoice, NoteEvent, Sound, VoicePool},
};

const SAMPLE_RATE: f32 = 48_000.0;

#[test]
fn recorder_wraps_and_interpolates() {
    let mut rec = RingRecorder::new(8);
    rec.configure(1, SAMPLE_RATE, 8).unwrap();

    rec.ingest(0, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_abs_diff_eq!(rec.read_interpolated(0, 3.5), 4.5);

    rec.ingest(0, &[9.0, 10.0, 11.0, 12.0]);
    assert_eq!(rec.track(0).unwrap(), &[9.0, 10.0, 11.0, 12.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(rec.write_position(0), 4);
    assert_abs_diff_eq!(rec.read_interpolated(0, 0.0), 9.0);
}

#[test]
fn retains_last_capacity_frames_exactly() {
    let capacity = 32;
    let mut rec = RingRecorder::new(capacity);
    rec.configure(1, SAMPLE_RATE, capacity).unwrap();

    // Ingest in uneven blocks so writes straddle the boundary
    let values: Vec<f32> = (0..capacity).map(|k| k as f32 * 0.25 - 3.0).collect();
    rec.ingest(0, &[0.0; 5]);
    for chunk in values.chunks(7) {
        rec.ingest(0, chunk);
    }

    let cursor = rec.write_position(0);
    for (k, &expected) in values.iter().enumerate() {
        let position = ((cursor + k) % capacity) as f64;
        assert_eq!(rec.read_interpolated(0, position), expected);
    }
}

#[test]
fn double_rate_voice_visits_even_frames() {
    let mut rec = RingRecorder::new(16);
    rec.configure(1, SAMPLE_RATE, 16).unwrap();
    let ramp: Vec<f32> = (0..16).map(|k| k as f32).collect();
    rec.ingest(0, &ramp);

    let mut voice = GrainVoice::new(SAMPLE_RATE);
    voice.prepare(SAMPLE_RATE, 4, 1).unwrap();
    voice
        .configure_envelope(EnvelopeParams::new(0.0, 0.0, 1.0, 0.0))
        .unwrap();
    voice.set_read_position(0, 0.0);
    voice.set_playback_rate(2.0);
    voice.start(60, 100, 0);

    let mut out = [vec![0.0f32; 4]];
    voice.render(&rec, &mut out, 0, 4);
    assert_eq!(out[0], vec![0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn reverse_voice_steps_back_one_frame_per_output_frame() {
    let capacity = 8;
    let mut rec = RingRecorder::new(capacity);
    rec.configure(1, SAMPLE_RATE, capacity).unwrap();

    let mut voice = GrainVoice::new(SAMPLE_RATE);
    voice.prepare(SAMPLE_RATE, 16, 1).unwrap();
    voice.set_read_position(0, 2.0);
    voice.set_playback_rate(-1.0);
    voice.start(60, 100, 0);

    let mut out = [vec![0.0f32; 16]];
    let mut expected = 2.0;
    for _ in 0..5 {
        voice.render(&rec, &mut out, 0, 1);
        expected = (expected - 1.0f64).rem_euclid(capacity as f64);
        assert_abs_diff_eq!(voice.read_position(0).unwrap(), expected);
    }
    // 2 → 1 → 0 → 7 → 6 → 5
    assert_abs_diff_eq!(voice.read_position(0).unwrap(), 5.0);
}

#[test]
fn third_note_steals_within_the_same_block() {
    let mut rec = RingRecorder::new(64);
    rec.configure(1, SAMPLE_RATE, 64).unwrap();
    rec.ingest(0, &[0.25; 64]);

    let mut pool = VoicePool::new(SAMPLE_RATE, 2).unwrap();
    pool.prepare(SAMPLE_RATE, 32, 1).unwrap();
    pool.bind(&rec, 16);

    let mut out = [vec![0.0f32; 32]];
    pool.render_block(
        &rec,
        &mut out,
        &[NoteEvent::note_on(0, 60, 100), NoteEvent::note_on(0, 62, 100)],
        32,
    );
    assert_eq!(pool.active_voice_count(), 2);
    let before = pool.voices()[0].level();
    assert!(before > 0.0);

    let mut out = [vec![0.0f32; 32]];
    pool.render_block(&rec, &mut out, &[NoteEvent::note_on(16, 64, 100)], 32);

    let notes: Vec<u8> = pool.voices().iter().map(|v| v.note()).collect();
    assert!(notes.contains(&64));
    assert!(notes.contains(&62));
    assert!(!notes.contains(&60));
    assert_eq!(pool.active_voice_count(), 2);

    // The stolen voice restarted its attack from silence
    let stolen = pool.voices().iter().find(|v| v.note() == 64).unwrap();
    assert!(stolen.level() < before);
}

#[test]
fn granular_sound_applies_everywhere() {
    assert!(Sound::Granular.applies_to_note(0));
    assert!(Sound::Granular.applies_to_note(127));
    assert!(Sound::Granular.applies_to_channel(15));
}
