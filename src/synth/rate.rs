#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// How a note number maps to a grain's playback rate.
///
/// The rate is the number of recorded frames a voice advances per output
/// frame: 1.0 replays at the original pitch, 2.0 an octave up, -1.0 backwards.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatePolicy {
    /// Every note plays at the same rate.
    Fixed(f64),
    /// Equal-tempered: `rate_at_root` for `root_note`, doubling per octave.
    KeyTracked { root_note: u8, rate_at_root: f64 },
}

impl RatePolicy {
    /// Playback rate for a MIDI note.
    #[inline]
    pub fn rate_for(&self, note: u8) -> f64 {
        match *self {
            RatePolicy::Fixed(rate) => rate,
            RatePolicy::KeyTracked {
                root_note,
                rate_at_root,
            } => rate_at_root * 2.0_f64.powf((note as f64 - root_note as f64) / 12.0),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let rate = match *self {
            RatePolicy::Fixed(rate) => rate,
            RatePolicy::KeyTracked { rate_at_root, .. } => rate_at_root,
        };

        if rate.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidPlaybackRate(rate))
        }
    }
}

impl Default for RatePolicy {
    fn default() -> Self {
        RatePolicy::Fixed(1.5)
    }
}
