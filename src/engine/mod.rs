//! Host-facing granular processor.
//!
//! [`GranularEngine`] owns the single [`RingRecorder`] and the [`VoicePool`]
//! that reads from it. Each block it records the input first and renders the
//! voices second, on the same thread, so readers never observe a partially
//! written block and no locking is needed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use log::{debug, info};

use crate::{
    dsp::{EnvelopeParams, RingRecorder},
    error::{ConfigError, Result},
    io::{AudioInput, AudioOutput},
    synth::{NoteEvent, RatePolicy, StealPolicy, VoicePool},
};

/// Everything needed to build or renegotiate an engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub channels: usize,
    pub sample_rate: f32,
    pub max_block_size: usize,
    /// Recorder length in frames per channel.
    pub buffer_frames: usize,
    pub voices: usize,
    pub envelope: EnvelopeParams,
    pub rate: RatePolicy,
    /// Constant gain applied by every voice before its envelope.
    pub voice_gain: f32,
    /// How much of the input is copied to the output before voices mix in.
    pub dry_level: f32,
    /// How far behind the write cursor voices start reading after a rebind.
    /// `None` means half the recorder.
    pub lookback_frames: Option<usize>,
    pub steal: StealPolicy,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(ConfigError::InvalidChannelCount(self.channels));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(self.max_block_size));
        }
        if self.voices == 0 {
            return Err(ConfigError::InvalidVoiceCount(self.voices));
        }
        self.envelope.validate()?;
        self.rate.validate()
    }

    fn lookback(&self, capacity: usize) -> usize {
        self.lookback_frames.unwrap_or(capacity / 2)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44_100.0,
            max_block_size: 512,
            buffer_frames: 44_100,
            voices: 16,
            envelope: EnvelopeParams::default(),
            rate: RatePolicy::default(),
            voice_gain: 0.1,
            dry_level: 0.0,
            lookback_frames: None,
            steal: StealPolicy::Enabled,
        }
    }
}

pub struct GranularEngine {
    config: EngineConfig,
    recorder: RingRecorder,
    pool: VoicePool,
}

impl GranularEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut engine = Self {
            recorder: RingRecorder::new(config.buffer_frames),
            pool: VoicePool::new(config.sample_rate, config.voices)?,
            config: config.clone(),
        };
        engine.configure(config)?;
        Ok(engine)
    }

    /// Renegotiate the audio format and policies.
    ///
    /// Clears the recorder, silences every voice and re-points their cursors.
    /// Must not run while a block is being processed.
    pub fn configure(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;

        if config.voices != self.pool.len() {
            self.pool = VoicePool::new(config.sample_rate, config.voices)?;
        }

        self.recorder
            .configure(config.channels, config.sample_rate, config.buffer_frames)?;
        self.pool
            .prepare(config.sample_rate, config.max_block_size, config.channels)?;
        self.pool.set_envelope(config.envelope)?;
        self.pool.set_rate_policy(config.rate)?;
        self.pool.set_steal_policy(config.steal);
        self.pool.set_voice_gain(config.voice_gain);

        let lookback = config.lookback(self.recorder.capacity());
        self.pool.bind(&self.recorder, lookback);

        info!(
            "granular engine configured: {} ch @ {} Hz, block {}, {} voices, recorder {} frames ({:.2}s)",
            config.channels,
            config.sample_rate,
            config.max_block_size,
            config.voices,
            self.recorder.capacity(),
            self.recorder.duration_secs()
        );
        debug!("voices bound {lookback} frames behind the write cursor");

        self.config = config;
        Ok(())
    }

    /// Clear recorded history and silence all voices, keeping the format.
    pub fn reset(&mut self) {
        self.recorder.reset();
        self.pool.reset();
        let lookback = self.config.lookback(self.recorder.capacity());
        self.pool.bind(&self.recorder, lookback);
    }

    /// Change the envelope shape of every voice.
    pub fn set_envelope(&mut self, params: EnvelopeParams) -> Result<()> {
        if params == self.pool.envelope() {
            return Ok(());
        }
        self.pool.set_envelope(params)?;
        self.config.envelope = params;
        debug!(
            "envelope set to A {}s D {}s S {} R {}s",
            params.attack, params.decay, params.sustain, params.release
        );
        Ok(())
    }

    /// Record one block of planar input and mix the voices into `output`.
    ///
    /// The block length is the shortest output channel, or the shortest input
    /// channel when there is no output. Output channels are
    /// overwritten with `dry_level * input` (silence where there is no input)
    /// before voices add into them. Channels beyond the recorder's receive no
    /// grains.
    pub fn process_block<I, O>(&mut self, input: &[I], output: &mut [O], events: &[NoteEvent])
    where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        let num_samples = output
            .iter_mut()
            .map(|ch| ch.as_mut().len())
            .min()
            .or_else(|| input.iter().map(|ch| ch.as_ref().len()).min())
            .unwrap_or(0);

        for (ch, samples) in input.iter().take(self.recorder.channels()).enumerate() {
            let samples = samples.as_ref();
            self.recorder.ingest(ch, &samples[..samples.len().min(num_samples)]);
        }

        let dry = self.config.dry_level;
        for (ch, out) in output.iter_mut().enumerate() {
            let out = &mut out.as_mut()[..num_samples];
            match input.get(ch) {
                Some(src) if dry != 0.0 => {
                    let src = src.as_ref();
                    for (i, o) in out.iter_mut().enumerate() {
                        *o = src.get(i).map_or(0.0, |s| s * dry);
                    }
                }
                _ => out.fill(0.0),
            }
        }

        self.pool
            .render_block(&self.recorder, output, events, num_samples);
        self.config.envelope = self.pool.envelope();
    }

    /// [`process_block`](Self::process_block) over the crate's buffer types.
    pub fn process(&mut self, input: &AudioInput, output: &mut AudioOutput, events: &[NoteEvent]) {
        self.process_block(&input.buffers, &mut output.buffers, events);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recorder(&self) -> &RingRecorder {
        &self.recorder
    }

    pub fn voices(&self) -> &VoicePool {
        &self.pool
    }

    pub fn voices_mut(&mut self) -> &mut VoicePool {
        &mut self.pool
    }
}
