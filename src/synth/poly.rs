#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{EnvelopeParams, RingRecorder},
    error::{ConfigError, Result},
    synth::{
        message::{NoteEvent, SynthMessage},
        rate::RatePolicy,
        sound::Sound,
        voice::{GrainVoice, VoiceState},
    },
};

/// What to do with a note-on when every voice is busy.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// Cut the quietest releasing voice, or the oldest held one, and reuse it.
    #[default]
    Enabled,
    /// Drop the new note.
    Disabled,
}

/// Fixed-size pool of grain voices reading from one shared recorder.
pub struct VoicePool {
    voices: Vec<GrainVoice>,
    sound: Sound,
    steal: StealPolicy,
    rate: RatePolicy,
    envelope: EnvelopeParams,
    frame_counter: u64,
}

impl VoicePool {
    pub fn new(sample_rate: f32, max_voices: usize) -> Result<Self> {
        if max_voices == 0 {
            return Err(ConfigError::InvalidVoiceCount(max_voices));
        }

        let voices = (0..max_voices)
            .map(|_| GrainVoice::new(sample_rate))
            .collect();

        Ok(Self {
            voices,
            sound: Sound::Granular,
            steal: StealPolicy::Enabled,
            rate: RatePolicy::default(),
            envelope: EnvelopeParams::default(),
            frame_counter: 0,
        })
    }

    /// Size every voice's scratch buffers for the new audio format.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize, channels: usize) -> Result<()> {
        for voice in &mut self.voices {
            voice.prepare(sample_rate, block_size, channels)?;
        }
        self.frame_counter = 0;
        Ok(())
    }

    /// Re-point every voice at the recorder's recent history.
    pub fn bind(&mut self, recorder: &RingRecorder, lookback: usize) {
        for voice in &mut self.voices {
            voice.bind(recorder, lookback);
        }
    }

    /// Silence all voices.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }

    /// Apply an envelope shape to every voice. Validated once up front so a
    /// bad shape leaves all voices untouched.
    pub fn set_envelope(&mut self, params: EnvelopeParams) -> Result<()> {
        params.validate()?;
        for voice in &mut self.voices {
            voice.configure_envelope(params)?;
        }
        self.envelope = params;
        Ok(())
    }

    pub fn envelope(&self) -> EnvelopeParams {
        self.envelope
    }

    pub fn set_rate_policy(&mut self, rate: RatePolicy) -> Result<()> {
        rate.validate()?;
        self.rate = rate;
        Ok(())
    }

    pub fn set_steal_policy(&mut self, steal: StealPolicy) {
        self.steal = steal;
    }

    pub fn set_voice_gain(&mut self, gain: f32) {
        for voice in &mut self.voices {
            voice.set_gain(gain);
        }
    }

    /// Start `note` on a free voice, stealing one if allowed.
    ///
    /// Returns the index of the voice that took the note, or `None` if the
    /// sound does not apply or the note was dropped.
    pub fn note_on(&mut self, note: u8, velocity: u8, sound: &Sound) -> Option<usize> {
        if !sound.applies_to_note(note) {
            return None;
        }

        // A repeated note releases the voice already holding it
        for voice in &mut self.voices {
            if voice.note() == note && voice.state() == VoiceState::Active {
                voice.stop(velocity, true);
            }
        }

        let idx = self.allocate_voice(sound)?;
        let age = self.frame_counter;
        let rate = self.rate.rate_for(note);

        let voice = &mut self.voices[idx];
        if !voice.is_free() {
            voice.stop(0, false);
        }
        voice.set_playback_rate(rate);
        voice.start(note, velocity, age);
        Some(idx)
    }

    /// Release every held voice playing `note`.
    pub fn note_off(&mut self, note: u8, velocity: u8, allow_tail_off: bool) {
        for voice in &mut self.voices {
            if voice.note() == note && voice.state() == VoiceState::Active {
                voice.stop(velocity, allow_tail_off);
            }
        }
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) {
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.stop(0, allow_tail_off);
            }
        }
    }

    /// Apply a single message immediately.
    pub fn handle_message(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn { note, velocity } => {
                let sound = self.sound;
                // Velocity 0 is a note-off by MIDI convention
                if velocity == 0 {
                    self.note_off(note, 0, true);
                } else {
                    self.note_on(note, velocity, &sound);
                }
            }
            SynthMessage::NoteOff { note, velocity } => self.note_off(note, velocity, true),
            SynthMessage::AllNotesOff { allow_tail_off } => self.all_notes_off(allow_tail_off),
            SynthMessage::SetEnvelope(params) => {
                // Invalid shapes are dropped; the audio thread has nowhere to report them
                if params != self.envelope {
                    let _ = self.set_envelope(params);
                }
            }
        }
    }

    /// Render `num_samples` frames, applying each event at its frame offset.
    ///
    /// Events are expected in time order. Offsets past the end of the block
    /// are applied after the last frame. Voice output is added into `out`.
    pub fn render_block<B: AsMut<[f32]>>(
        &mut self,
        recorder: &RingRecorder,
        out: &mut [B],
        events: &[NoteEvent],
        num_samples: usize,
    ) {
        let mut pos = 0;

        for event in events {
            let offset = event.offset.clamp(pos, num_samples);
            self.render_voices(recorder, out, pos, offset - pos);
            pos = offset;
            self.handle_message(event.message);
        }

        self.render_voices(recorder, out, pos, num_samples - pos);
    }

    fn render_voices<B: AsMut<[f32]>>(
        &mut self,
        recorder: &RingRecorder,
        out: &mut [B],
        start: usize,
        len: usize,
    ) {
        if len == 0 {
            return;
        }

        for voice in &mut self.voices {
            voice.render(recorder, out, start, len);
        }

        self.frame_counter += len as u64;
    }

    fn allocate_voice(&self, sound: &Sound) -> Option<usize> {
        // First pass: find a free voice that can play this sound
        let free_idx = self
            .voices
            .iter()
            .position(|v| v.is_free() && v.can_play(sound));
        if free_idx.is_some() {
            return free_idx;
        }

        if self.steal == StealPolicy::Disabled {
            return None;
        }

        // Second pass: the quietest releasing voice
        let releasing = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing && v.can_play(sound))
            .min_by(|(_, a), (_, b)| a.level().total_cmp(&b.level()))
            .map(|(idx, _)| idx);
        if releasing.is_some() {
            return releasing;
        }

        // Last resort: the oldest held voice
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.can_play(sound))
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx)
    }

    pub fn voices(&self) -> &[GrainVoice] {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut [GrainVoice] {
        &mut self.voices
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
