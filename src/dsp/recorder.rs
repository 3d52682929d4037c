use log::warn;

use crate::{
    dsp::math::lerp,
    error::{ConfigError, Result},
};

/*
Ring Recorder
=============

A fixed-capacity, multi-channel circular store that is written once per audio
block and read by any number of grain voices at fractional positions.

Vocabulary
----------

  capacity      Frames per channel. Fixed between `configure` calls. Never
                smaller than MIN_CAPACITY.

  track         One channel's sample storage, exactly `capacity` long.

  write cursor  Per-channel index of the next frame to be overwritten. This is
                also the OLDEST frame still held.

  position      A real-valued frame index used by readers. Integer part picks
                the frame, fractional part interpolates toward the next one.


The Shape
---------

        write cursor
             ↓
    ┌────┬────┬────┬────┬────┬────┬────┬────┐
    │ 9  │ 10 │ 11 │ 12 │ 5  │ 6  │ 7  │ 8  │   capacity = 8
    └────┴────┴────┴────┴────┴────┴────┴────┘
      newest ──────→       oldest ───────→

After ingesting [1..=8] and then [9, 10, 11, 12], the cursor sits on index 4:
the next write lands on top of the oldest frame (5).


Wrapped Writes
--------------

A block that runs past the end of a track is split into two contiguous copies:

    [cursor, capacity)  ←  head of the block
    [0, remainder)      ←  tail of the block

A block longer than the whole track only keeps its last `capacity` frames; the
earlier ones would have been overwritten within the same copy anyway.


Interpolated Reads
------------------

    i = floor(position), f = position - i
    s0 = track[i mod capacity], s1 = track[(i + 1) mod capacity]
    out = s0 + f * (s1 - s0)

The modulo is floored, so negative and oversized positions wrap instead of
indexing out of bounds. Reads of frames that were never written return the
zeroed contents: silence, not an error.
*/

/// Smallest capacity a recorder will allocate, in frames per channel.
pub const MIN_CAPACITY: usize = 4;

/// Multi-channel circular sample store shared by all grain voices.
#[derive(Debug, Clone)]
pub struct RingRecorder {
    tracks: Vec<Vec<f32>>,
    write_pos: Vec<usize>,
    capacity: usize,
    sample_rate: f32,
}

impl RingRecorder {
    /// Create an unconfigured recorder holding `capacity` frames of one
    /// silent channel. Call [`configure`](Self::configure) before use.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            tracks: vec![vec![0.0; capacity]],
            write_pos: vec![0],
            capacity,
            sample_rate: 44_100.0,
        }
    }

    /// Reallocate storage for `channels` tracks of `max(capacity, 4)` frames,
    /// zero every sample and reset every write cursor.
    ///
    /// Control path only: this allocates.
    pub fn configure(&mut self, channels: usize, sample_rate: f32, capacity: usize) -> Result<()> {
        if channels == 0 {
            return Err(ConfigError::InvalidChannelCount(channels));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if capacity < MIN_CAPACITY {
            warn!("recorder capacity {capacity} raised to the minimum of {MIN_CAPACITY} frames");
        }

        self.capacity = capacity.max(MIN_CAPACITY);
        self.sample_rate = sample_rate;
        self.tracks = vec![vec![0.0; self.capacity]; channels];
        self.write_pos = vec![0; channels];
        Ok(())
    }

    /// Zero all samples and cursors, keeping the allocated capacity.
    pub fn reset(&mut self) {
        for track in &mut self.tracks {
            track.fill(0.0);
        }
        self.write_pos.fill(0);
    }

    /// Append a block of samples to `channel`, wrapping at the end of the track.
    ///
    /// Realtime safe. An out-of-range channel is a caller bug: it trips a debug
    /// assertion and is otherwise ignored.
    pub fn ingest(&mut self, channel: usize, samples: &[f32]) {
        let capacity = self.capacity;
        let (Some(track), Some(cursor)) =
            (self.tracks.get_mut(channel), self.write_pos.get_mut(channel))
        else {
            debug_assert!(false, "ingest into channel {channel} out of range");
            return;
        };

        let len = samples.len();

        // Only the most recent `capacity` frames survive an oversized block
        let (src, start) = if len > capacity {
            (&samples[len - capacity..], (*cursor + len - capacity) % capacity)
        } else {
            (samples, *cursor)
        };

        let head = (capacity - start).min(src.len());
        track[start..start + head].copy_from_slice(&src[..head]);
        track[..src.len() - head].copy_from_slice(&src[head..]);

        *cursor = (*cursor + len % capacity) % capacity;
    }

    /// Linearly interpolated read at a fractional frame `position`.
    ///
    /// Any finite position is accepted and wrapped with a floored modulo.
    #[inline]
    pub fn read_interpolated(&self, channel: usize, position: f64) -> f32 {
        let Some(track) = self.tracks.get(channel) else {
            debug_assert!(false, "read from channel {channel} out of range");
            return 0.0;
        };

        let floor = position.floor();
        let frac = (position - floor) as f32;
        let capacity = self.capacity as i64;

        let i0 = (floor as i64).rem_euclid(capacity) as usize;
        let i1 = if i0 + 1 == self.capacity { 0 } else { i0 + 1 };

        lerp(track[i0], track[i1], frac)
    }

    /// Frames per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of configured channels.
    pub fn channels(&self) -> usize {
        self.tracks.len()
    }

    /// Length of recorded history in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.capacity as f32 / self.sample_rate
    }

    /// Index of the next frame to be overwritten on `channel`.
    pub fn write_position(&self, channel: usize) -> usize {
        self.write_pos.get(channel).copied().unwrap_or(0)
    }

    /// Raw contents of a channel's track, oldest-first starting at the write cursor.
    pub fn track(&self, channel: usize) -> Option<&[f32]> {
        self.tracks.get(channel).map(Vec::as_slice)
    }
}

impl Default for RingRecorder {
    fn default() -> Self {
        Self::new(MIN_CAPACITY)
    }
}
