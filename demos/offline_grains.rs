/// Demonstrates live granular playback without an audio device.
/// Feeds a sine sweep into the engine block by block, plays a chord and
/// reports what the voices are doing.
use std::f32::consts::TAU;

use rtrb::RingBuffer;
use saavy_grain::{
    dsp::EnvelopeParams,
    synth::{MessageReceiver, NoteEvent, RatePolicy, SynthMessage},
    EngineConfig, GranularEngine,
};

fn main() -> saavy_grain::Result<()> {
    println!("=== Granular Demo (Offline) ===\n");

    let sample_rate = 48_000.0;
    let block_size = 256;

    let config = EngineConfig {
        channels: 1,
        sample_rate,
        max_block_size: block_size,
        buffer_frames: sample_rate as usize,
        voices: 4,
        envelope: EnvelopeParams::new(0.05, 0.1, 0.6, 0.2),
        rate: RatePolicy::KeyTracked {
            root_note: 60,
            rate_at_root: 1.0,
        },
        voice_gain: 0.25,
        ..EngineConfig::default()
    };
    let mut engine = GranularEngine::new(config)?;

    // Control thread → audio thread queue
    let (mut tx, mut rx) = RingBuffer::<SynthMessage>::new(64);

    let mut phase = 0.0f32;
    let mut elapsed = 0usize;
    let mut input = [vec![0.0f32; block_size]];
    let mut output = [vec![0.0f32; block_size]];
    let mut events = Vec::with_capacity(64);

    let mut render = |engine: &mut GranularEngine, rx: &mut rtrb::Consumer<SynthMessage>| {
        // 220 Hz rising to ~880 Hz over the recorded second
        for sample in input[0].iter_mut() {
            let freq = 220.0 + 660.0 * (elapsed as f32 / sample_rate).min(1.0);
            phase = (phase + TAU * freq / sample_rate) % TAU;
            elapsed += 1;
            *sample = phase.sin();
        }

        events.clear();
        while let Some(message) = MessageReceiver::pop(rx) {
            events.push(NoteEvent::new(0, message));
        }

        engine.process_block(&input, &mut output, &events);
        output[0].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    };

    println!("Recording one second of input before playing...");
    for _ in 0..(sample_rate as usize / block_size) {
        render(&mut engine, &mut rx);
    }

    println!("\nPlaying C major chord (C4, E4, G4)");
    for note in [60, 64, 67] {
        let _ = tx.push(SynthMessage::NoteOn {
            note,
            velocity: 100,
        });
    }
    let peak = render(&mut engine, &mut rx);
    println!("  Active voices: {}", engine.voices().active_voice_count());
    println!("  Peak amplitude: {:.3}", peak);

    for voice in engine.voices().voices().iter().filter(|v| v.is_active()) {
        println!(
            "  note {} plays at {:.3}x from frame {:.1}",
            voice.note(),
            voice.playback_rate(),
            voice.read_position(0).unwrap_or(0.0)
        );
    }

    println!("\nAdding B4 and D5 - the second triggers voice stealing");
    let _ = tx.push(SynthMessage::NoteOn {
        note: 71,
        velocity: 100,
    });
    let _ = tx.push(SynthMessage::NoteOn {
        note: 74,
        velocity: 100,
    });
    render(&mut engine, &mut rx);
    println!("  Active voices: {} (max)", engine.voices().active_voice_count());

    println!("\nSlowing the release to 500ms, then releasing everything");
    let _ = tx.push(SynthMessage::SetEnvelope(EnvelopeParams::new(
        0.05, 0.1, 0.6, 0.5,
    )));
    let _ = tx.push(SynthMessage::AllNotesOff {
        allow_tail_off: true,
    });

    let mut blocks = 0;
    while engine.voices().active_voice_count() > 0 {
        render(&mut engine, &mut rx);
        blocks += 1;
    }
    println!(
        "  All voices free after {} blocks ({:.0}ms)",
        blocks,
        blocks as f32 * block_size as f32 / sample_rate * 1000.0
    );

    println!("\n=== Granular Architecture ===");
    println!("• Input is always recorded first, then voices render from the same history");
    println!("• Each voice keeps its own fractional read cursor and playback rate");
    println!("• Voice states: Free → Active → Releasing → Free");
    println!("• Stealing prefers the quietest releasing voice, then the oldest held one");
    Ok(())
}
