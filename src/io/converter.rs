use crate::{
    io::midi::MidiEvent,
    synth::message::{NoteEvent, SynthMessage},
};

/// MIDI "All Notes Off" controller.
const CC_ALL_NOTES_OFF: u8 = 123;
/// MIDI "All Sound Off" controller, a hard cut.
const CC_ALL_SOUND_OFF: u8 = 120;

pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(SynthMessage::NoteOff {
            note: key,
            velocity,
        }),
        MidiEvent::ControlChange {
            channel,
            controller,
            ..
        } if channel == channel_filter => match controller {
            CC_ALL_NOTES_OFF => Some(SynthMessage::AllNotesOff {
                allow_tail_off: true,
            }),
            CC_ALL_SOUND_OFF => Some(SynthMessage::AllNotesOff {
                allow_tail_off: false,
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Timestamp a MIDI message at `offset` frames into the current block.
pub fn midi_to_event(midi: MidiEvent, channel_filter: u8, offset: usize) -> Option<NoteEvent> {
    midi_to_synth(midi, channel_filter).map(|message| NoteEvent::new(offset, message))
}

/// Split interleaved frames into planar channels. Writes as many whole frames
/// as fit in the shortest destination channel and returns that count.
pub fn deinterleave<B: AsMut<[f32]>>(interleaved: &[f32], planar: &mut [B]) -> usize {
    let channels = planar.len();
    if channels == 0 {
        return 0;
    }

    let frames = planar
        .iter_mut()
        .map(|ch| ch.as_mut().len())
        .min()
        .unwrap_or(0)
        .min(interleaved.len() / channels);

    for (ch, dest) in planar.iter_mut().enumerate() {
        let dest = dest.as_mut();
        for (frame, sample) in dest[..frames].iter_mut().enumerate() {
            *sample = interleaved[frame * channels + ch];
        }
    }

    frames
}

/// Merge planar channels into interleaved frames. Returns the frame count.
pub fn interleave<B: AsRef<[f32]>>(planar: &[B], interleaved: &mut [f32]) -> usize {
    let channels = planar.len();
    if channels == 0 {
        return 0;
    }

    let frames = planar
        .iter()
        .map(|ch| ch.as_ref().len())
        .min()
        .unwrap_or(0)
        .min(interleaved.len() / channels);

    for (ch, src) in planar.iter().enumerate() {
        for (frame, &sample) in src.as_ref()[..frames].iter().enumerate() {
            interleaved[frame * channels + ch] = sample;
        }
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_channel() {
        let on = MidiEvent::NoteOn {
            channel: 2,
            key: 64,
            velocity: 90,
        };
        assert_eq!(midi_to_synth(on, 0), None);
        assert_eq!(
            midi_to_event(on, 2, 17),
            Some(NoteEvent::note_on(17, 64, 90))
        );
    }

    #[test]
    fn all_notes_off_controllers() {
        let cc = |controller| MidiEvent::ControlChange {
            channel: 0,
            controller,
            value: 0,
        };
        assert_eq!(
            midi_to_synth(cc(123), 0),
            Some(SynthMessage::AllNotesOff {
                allow_tail_off: true
            })
        );
        assert_eq!(
            midi_to_synth(cc(120), 0),
            Some(SynthMessage::AllNotesOff {
                allow_tail_off: false
            })
        );
        assert_eq!(midi_to_synth(cc(1), 0), None);
    }

    #[test]
    fn deinterleave_splits_frames() {
        let interleaved = [1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let mut planar = [vec![0.0f32; 3], vec![0.0f32; 3]];

        assert_eq!(deinterleave(&interleaved, &mut planar), 3);
        assert_eq!(planar[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(planar[1], vec![-1.0, -2.0, -3.0]);

        let mut back = [0.0f32; 6];
        assert_eq!(interleave(&planar, &mut back), 3);
        assert_eq!(back, interleaved);
    }

    #[test]
    fn deinterleave_stops_at_shortest_side() {
        let interleaved = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut planar = [vec![0.0f32; 4], vec![0.0f32; 4]];
        assert_eq!(deinterleave(&interleaved, &mut planar), 2);
    }
}
