//! Audio setup: cpal input → rtrb ring → engine → cpal output

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use saavy_grain::{
    io::interleave,
    synth::{MessageReceiver, NoteEvent, SynthMessage},
    EngineConfig, GranularEngine, MAX_BLOCK_SIZE,
};

use super::ui::{UiApp, UiInit, UiUpdate, VoiceMeter, MAX_UI_VOICES};

const MESSAGE_QUEUE_SIZE: usize = 64;
const SCOPE_RING_SIZE: usize = 16 * 1024;
const UI_STATE_RING_SIZE: usize = 32;
/// Input ring holds half a second of audio
const INPUT_RING_SECONDS: f32 = 0.5;

pub fn run() -> EyreResult<()> {
    let host = cpal::default_host();
    let output_device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let input_device = host
        .default_input_device()
        .ok_or_else(|| eyre!("no default input device available"))?;

    let output_config = output_device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;
    let input_config = input_device
        .default_input_config()
        .wrap_err("failed to fetch default input config")?;

    if output_config.sample_format() != cpal::SampleFormat::F32
        || input_config.sample_format() != cpal::SampleFormat::F32
    {
        return Err(eyre!("grain requires f32 input and output sample formats"));
    }

    let sample_rate = output_config.sample_rate().0 as f32;
    let out_channels = output_config.channels() as usize;
    let in_channels = input_config.channels() as usize;

    if input_config.sample_rate() != output_config.sample_rate() {
        warn!(
            "input runs at {} Hz, output at {} Hz; grains will be pitched accordingly",
            input_config.sample_rate().0,
            sample_rate
        );
    }

    let config = EngineConfig {
        channels: out_channels,
        sample_rate,
        max_block_size: MAX_BLOCK_SIZE,
        buffer_frames: sample_rate as usize,
        ..EngineConfig::default()
    };
    let engine = GranularEngine::new(config.clone()).wrap_err("invalid engine configuration")?;
    info!("{in_channels} input channel(s), {out_channels} output channel(s) @ {sample_rate} Hz");

    // --- Cross-thread rings ---
    let input_len = (sample_rate * INPUT_RING_SECONDS) as usize * in_channels;
    let (mut input_tx, input_rx) = RingBuffer::<f32>::new(input_len.max(MAX_BLOCK_SIZE));
    let (msg_tx, msg_rx) = RingBuffer::<SynthMessage>::new(MESSAGE_QUEUE_SIZE);
    let (scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_RING_SIZE);
    let (state_tx, state_rx) = RingBuffer::<UiUpdate>::new(UI_STATE_RING_SIZE);

    let input_stream = input_device
        .build_input_stream(
            &input_config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Overflow drops the newest samples; the recorder only wants recent audio anyway
                for &sample in data {
                    if input_tx.push(sample).is_err() {
                        break;
                    }
                }
            },
            |err| error!("input stream error: {err}"),
            None,
        )
        .wrap_err("failed to build input stream")?;

    let mut renderer = Renderer::new(
        engine,
        in_channels,
        out_channels,
        input_rx,
        msg_rx,
        scope_tx,
        state_tx,
    );

    let output_stream = output_device
        .build_output_stream(
            &output_config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.fill(data),
            |err| error!("output stream error: {err}"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    input_stream.play().wrap_err("failed to start input stream")?;
    output_stream.play().wrap_err("failed to start output stream")?;

    let init = UiInit {
        sample_rate,
        channels: out_channels,
        voices: config.voices,
        buffer_frames: config.buffer_frames,
        rate: config.rate,
        envelope: config.envelope,
    };

    let mut terminal = ratatui::init();
    let result = UiApp::new(init, msg_tx, scope_rx, state_rx).run(&mut terminal);
    ratatui::restore();

    result
}

/// Everything the output callback owns. Buffers are sized once up front.
struct Renderer {
    engine: GranularEngine,
    in_channels: usize,
    out_channels: usize,
    input_rx: Consumer<f32>,
    msg_rx: Consumer<SynthMessage>,
    scope_tx: Producer<f32>,
    state_tx: Producer<UiUpdate>,
    input: Vec<Vec<f32>>,
    output: Vec<Vec<f32>>,
    events: Vec<NoteEvent>,
    frame: Vec<f32>,
}

impl Renderer {
    fn new(
        engine: GranularEngine,
        in_channels: usize,
        out_channels: usize,
        input_rx: Consumer<f32>,
        msg_rx: Consumer<SynthMessage>,
        scope_tx: Producer<f32>,
        state_tx: Producer<UiUpdate>,
    ) -> Self {
        Self {
            engine,
            in_channels,
            out_channels,
            input_rx,
            msg_rx,
            scope_tx,
            state_tx,
            input: vec![Vec::with_capacity(MAX_BLOCK_SIZE); out_channels],
            output: vec![Vec::with_capacity(MAX_BLOCK_SIZE); out_channels],
            events: Vec::with_capacity(MESSAGE_QUEUE_SIZE),
            frame: vec![0.0; in_channels.max(1)],
        }
    }

    fn fill(&mut self, data: &mut [f32]) {
        let total_frames = data.len() / self.out_channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

            // Within capacity, so no allocation
            for buf in self.input.iter_mut().chain(self.output.iter_mut()) {
                buf.resize(frames, 0.0);
            }

            self.pull_input(frames);
            self.pull_messages();

            self.engine
                .process_block(self.input.as_slice(), self.output.as_mut_slice(), &self.events);

            let out_off = frames_written * self.out_channels;
            interleave(self.output.as_slice(), &mut data[out_off..out_off + frames * self.out_channels]);

            self.publish(frames);
            frames_written += frames;
        }
    }

    // Missing input (underrun) records as silence
    fn pull_input(&mut self, frames: usize) {
        for i in 0..frames {
            for sample in self.frame.iter_mut() {
                *sample = self.input_rx.pop().unwrap_or(0.0);
            }
            // Mono input feeds every channel; extra input channels are dropped
            for (ch, buf) in self.input.iter_mut().enumerate() {
                buf[i] = self.frame[ch % self.in_channels.max(1)];
            }
        }
    }

    fn pull_messages(&mut self) {
        self.events.clear();
        while self.events.len() < self.events.capacity() {
            match MessageReceiver::pop(&mut self.msg_rx) {
                Some(message) => self.events.push(NoteEvent::new(0, message)),
                None => break,
            }
        }
    }

    fn publish(&mut self, frames: usize) {
        for i in 0..frames {
            let mono = self.output.iter().map(|ch| ch[i]).sum::<f32>() / self.out_channels as f32;
            if self.scope_tx.push(mono).is_err() {
                break;
            }
        }

        let mut update = UiUpdate::default();
        for (meter, voice) in update
            .voices
            .iter_mut()
            .zip(self.engine.voices().voices().iter().take(MAX_UI_VOICES))
        {
            *meter = VoiceMeter {
                active: voice.is_active(),
                level: voice.level(),
                note: voice.note(),
            };
        }
        update.active_voices = self.engine.voices().active_voice_count() as u8;
        let _ = self.state_tx.push(update);
    }
}
