use crate::{
    dsp::{math::wrap, Envelope, EnvelopeParams, RingRecorder},
    error::{ConfigError, Result},
    synth::sound::Sound,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One unit of polyphony: a read cursor per channel into the shared
/// [`RingRecorder`] plus an amplitude envelope.
///
/// The voice never owns the recorder. It is handed a reference on every
/// [`render`](Self::render) call, so the recorder always outlives the read.
pub struct GrainVoice {
    note: u8,
    velocity: u8,
    state: VoiceState,
    age: u64,

    envelope: Envelope,
    gain: f32,

    read_pos: Vec<f64>,
    playback_rate: f64,

    // channels x block_size, reused every render
    scratch: Vec<Vec<f32>>,
    block_size: usize,
    prepared: bool,
}

impl GrainVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            note: 0,
            velocity: 0,
            state: VoiceState::Free,
            age: 0,
            envelope: Envelope::new(sample_rate),
            gain: 1.0,
            read_pos: Vec::new(),
            playback_rate: 1.0,
            scratch: Vec::new(),
            block_size: 0,
            prepared: false,
        }
    }

    /// Allocate scratch storage for `channels` x `block_size` frames and
    /// silence the voice. Control path only.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize, channels: usize) -> Result<()> {
        if channels == 0 {
            return Err(ConfigError::InvalidChannelCount(channels));
        }
        if block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(block_size));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }

        self.envelope.set_sample_rate(sample_rate);
        self.scratch = vec![vec![0.0; block_size]; channels];
        self.block_size = block_size;
        self.read_pos.resize(channels, 0.0);
        self.reset();
        self.prepared = true;
        Ok(())
    }

    /// Point every channel's cursor `lookback` frames behind the recorder's
    /// write cursor, so playback starts in recently recorded audio.
    pub fn bind(&mut self, recorder: &RingRecorder, lookback: usize) {
        let capacity = recorder.capacity() as f64;
        self.read_pos.resize(recorder.channels(), 0.0);

        for (ch, pos) in self.read_pos.iter_mut().enumerate() {
            let write = recorder.write_position(ch) as f64;
            *pos = wrap(write - lookback as f64, capacity);
        }
    }

    pub fn can_play(&self, sound: &Sound) -> bool {
        matches!(sound, Sound::Granular)
    }

    /// Trigger the envelope. Read position and rate are left to the caller.
    pub fn start(&mut self, note: u8, velocity: u8, age: u64) {
        self.note = note;
        self.velocity = velocity;
        self.state = VoiceState::Active;
        self.age = age;
        self.envelope.note_on();
    }

    /// Release the note. A hard stop (`allow_tail_off == false`) frees the
    /// voice immediately.
    pub fn stop(&mut self, _velocity: u8, allow_tail_off: bool) {
        if self.state == VoiceState::Free {
            return;
        }

        self.envelope.note_off(allow_tail_off);

        if self.envelope.is_active() {
            self.state = VoiceState::Releasing;
        } else {
            self.free();
        }
    }

    /// Add `num_samples` frames of grain playback into `out` starting at
    /// `start_sample`. No-op while the voice is free.
    pub fn render<B: AsMut<[f32]>>(
        &mut self,
        recorder: &RingRecorder,
        out: &mut [B],
        start_sample: usize,
        num_samples: usize,
    ) {
        if !self.is_active() || !self.prepared {
            return;
        }

        let channels = self
            .scratch
            .len()
            .min(self.read_pos.len())
            .min(recorder.channels())
            .min(out.len());

        let available = out[..channels]
            .iter_mut()
            .map(|buf| buf.as_mut().len())
            .min()
            .map_or(num_samples, |len| len.saturating_sub(start_sample));
        let num_samples = num_samples.min(available);

        let capacity = recorder.capacity() as f64;
        let rate = self.playback_rate;
        let mut done = 0;

        while done < num_samples {
            let n = (num_samples - done).min(self.block_size);

            // Read every channel first so all channels see the same envelope
            for ch in 0..channels {
                let pos = &mut self.read_pos[ch];
                for sample in self.scratch[ch][..n].iter_mut() {
                    *sample = recorder.read_interpolated(ch, *pos);
                    *pos = wrap(*pos + rate, capacity);
                }
            }

            for i in 0..n {
                let amp = self.envelope.tick() * self.gain;
                for track in self.scratch[..channels].iter_mut() {
                    track[i] *= amp;
                }
            }

            let offset = start_sample + done;
            for (ch, track) in self.scratch[..channels].iter().enumerate() {
                let dest = &mut out[ch].as_mut()[offset..offset + n];
                for (d, s) in dest.iter_mut().zip(&track[..n]) {
                    *d += s;
                }
            }

            done += n;
        }

        if !self.envelope.is_active() {
            self.free();
        }
    }

    /// Silence the envelope and return to the free pool.
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.free();
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.velocity = 0;
    }

    pub fn configure_envelope(&mut self, params: EnvelopeParams) -> Result<()> {
        self.envelope.configure(params)
    }

    pub fn envelope_params(&self) -> EnvelopeParams {
        self.envelope.params()
    }

    /// Non-finite rates are ignored and the previous rate is kept.
    pub fn set_playback_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.playback_rate = rate;
        }
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Move one channel's cursor. Ignored for channels the voice does not have.
    pub fn set_read_position(&mut self, channel: usize, position: f64) {
        if let Some(pos) = self.read_pos.get_mut(channel) {
            *pos = position;
        }
    }

    pub fn read_position(&self, channel: usize) -> Option<f64> {
        self.read_pos.get(channel).copied()
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}
