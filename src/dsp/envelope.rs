#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    MIN_TIME,
};

/*
ADSR Envelope
=============

Linear attack/decay/sustain/release shaper applied to every grain voice.

Vocabulary
----------

  level       Current output multiplier, always within [0, 1].

  stage       Idle, Attack, Decay, Sustain or Release.

  step        How far `level` moves per sample. Derived from the stage time
              and the sample rate every tick, so parameter changes take effect
              on the very next sample without touching `level`.


State Machine
-------------

    Idle ──note_on──→ Attack ──level=1──→ Decay ──level=S──→ Sustain
     ↑                  │                   │                   │
     │                  └──────note_off─────┴──────note_off─────┤
     │                                                          ↓
     └─────────────────────────level=0────────────────────── Release

note_off(false) skips Release entirely and snaps to Idle at level 0. That is
how a stolen voice is silenced before it is reused.


Retriggering
------------

note_on never resets `level`. The new Attack climbs from wherever the previous
note left off, at the same per-sample rate as a fresh attack:

    step = 1 / (attack_time * sample_rate)

A retrigger at level 0.6 therefore reaches 1.0 after 40% of the attack time
instead of jumping back to zero and clicking.


Release
-------

At note_off we snapshot the starting level and the number of release samples,
then interpolate linearly to exactly 0.0. Changing `release_time` mid-release
only affects the next note_off.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Ramping up from the current level to 1.0
    Decay,   // Ramping down from 1.0 to the sustain level
    Sustain, // Holding while the gate is high
    Release, // Gate went low, ramping down to 0
}

/// Envelope shape: times in seconds, sustain as a `[0, 1]` ratio.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Reject negative or non-finite times and sustain levels outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for (stage, seconds) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ConfigError::NegativeTime { stage, seconds });
            }
        }

        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(ConfigError::SustainOutOfRange(self.sustain));
        }

        Ok(())
    }
}

impl Default for EnvelopeParams {
    /// 50ms fade in and out around a full-level sustain.
    fn default() -> Self {
        Self::new(0.05, 0.0, 1.0, 0.05)
    }
}

pub struct Envelope {
    params: EnvelopeParams,
    sample_rate: f32,

    stage: EnvelopeStage,
    level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, EnvelopeParams::default())
    }

    /// Build an envelope without validation. Out-of-range values are clamped
    /// and a NaN sustain falls back to the default level.
    pub fn with_params(sample_rate: f32, params: EnvelopeParams) -> Self {
        Self {
            params: EnvelopeParams {
                attack: params.attack.max(0.0),
                decay: params.decay.max(0.0),
                sustain: if params.sustain.is_nan() {
                    EnvelopeParams::default().sustain
                } else {
                    params.sustain.clamp(0.0, 1.0)
                },
                release: params.release.max(0.0),
            },
            sample_rate,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Replace the envelope shape. Takes effect immediately, even mid-stage;
    /// the current level is preserved.
    pub fn configure(&mut self, params: EnvelopeParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Gate high: enter Attack from the current level.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low. With `allow_tail_off` the envelope releases from its current
    /// level; without it, it cuts straight to Idle.
    pub fn note_off(&mut self, allow_tail_off: bool) {
        if !allow_tail_off {
            self.reset();
            return;
        }

        if self.stage == EnvelopeStage::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = if self.params.release <= MIN_TIME {
            1
        } else {
            (self.params.release * self.sample_rate).round().max(1.0) as u32
        };
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance by one sample period and return the new level.
    pub fn tick(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.level += 1.0 / self.stage_samples(self.params.attack);

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let target = self.params.sustain;
                let drop = (1.0 - target) / self.stage_samples(self.params.decay);
                self.level -= drop;

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.params.sustain;
            }

            EnvelopeStage::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Fill `buffer` with consecutive envelope levels.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick();
        }
    }

    /// True unless the envelope is Idle.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Reset to Idle at level 0.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_elapsed_samples = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    // Stage length in samples, at least one so zero-length stages finish in a tick
    fn stage_samples(&self, seconds: f32) -> f32 {
        (seconds * self.sample_rate).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn envelope(attack: f32, decay: f32, sustain: f32, release: f32) -> Envelope {
        Envelope::with_params(SAMPLE_RATE, EnvelopeParams::new(attack, decay, sustain, release))
    }

    fn tick_n(env: &mut Envelope, samples: usize) -> Vec<f32> {
        (0..samples).map(|_| env.tick()).collect()
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = envelope(0.01, 0.1, 0.7, 0.2);
        env.note_on();
        tick_n(&mut env, (0.01 * SAMPLE_RATE) as usize + 1);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_ne!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn attack_is_monotonic() {
        let mut env = envelope(0.02, 0.05, 0.5, 0.1);
        env.note_on();
        let levels = tick_n(&mut env, 20);

        assert!(levels.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = envelope(0.01, 0.05, sustain, 0.2);
        env.note_on();
        tick_n(&mut env, ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5);

        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert_abs_diff_eq!(env.level(), sustain);
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = envelope(0.01, 0.05, 0.5, release);
        env.note_on();
        tick_n(&mut env, 20);

        env.note_off(true);
        let levels = tick_n(&mut env, (release * SAMPLE_RATE) as usize);

        assert!(levels.windows(2).all(|w| w[1] <= w[0]));
        assert_abs_diff_eq!(env.level(), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert!(!env.is_active());
    }

    #[test]
    fn note_off_during_attack_releases_from_current_level() {
        let mut env = envelope(0.1, 0.05, 0.5, 0.01);
        env.note_on();
        tick_n(&mut env, 50);
        let before = env.level();

        env.note_off(true);
        assert_eq!(env.stage(), EnvelopeStage::Release);
        assert_abs_diff_eq!(env.tick(), before);
    }

    #[test]
    fn hard_cut_goes_straight_to_idle() {
        let mut env = envelope(0.01, 0.0, 1.0, 0.5);
        env.note_on();
        tick_n(&mut env, 30);

        env.note_off(false);
        assert!(!env.is_active());
        assert_abs_diff_eq!(env.level(), 0.0);
    }

    #[test]
    fn retrigger_continues_from_current_level() {
        let mut env = envelope(0.01, 0.0, 1.0, 0.1);
        env.note_on();
        tick_n(&mut env, 20);
        env.note_off(true);
        tick_n(&mut env, 30);
        let before = env.level();
        assert!(before > 0.0);

        env.note_on();
        let after = env.tick();
        assert!(after >= before, "retrigger dropped from {before} to {after}");
    }

    #[test]
    fn zero_times_finish_in_one_tick() {
        let mut env = envelope(0.0, 0.0, 0.25, 0.0);
        env.note_on();
        assert_abs_diff_eq!(env.tick(), 1.0);
        assert_abs_diff_eq!(env.tick(), 0.25);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);

        env.note_off(true);
        assert_abs_diff_eq!(env.tick(), 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn configure_preserves_level_mid_stage() {
        let mut env = envelope(0.1, 0.0, 1.0, 0.1);
        env.note_on();
        tick_n(&mut env, 10);
        let level = env.level();

        env.configure(EnvelopeParams::new(0.5, 0.0, 1.0, 0.1)).unwrap();
        assert_abs_diff_eq!(env.level(), level);
        assert_eq!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn configure_rejects_invalid_params() {
        let mut env = Envelope::new(SAMPLE_RATE);
        assert!(matches!(
            env.configure(EnvelopeParams::new(-0.1, 0.0, 1.0, 0.1)),
            Err(ConfigError::NegativeTime { stage: "attack", .. })
        ));
        assert_eq!(
            env.configure(EnvelopeParams::new(0.1, 0.0, 1.5, 0.1)),
            Err(ConfigError::SustainOutOfRange(1.5))
        );
        assert_eq!(env.params(), EnvelopeParams::default());
    }

    #[test]
    fn nan_sustain_falls_back_to_default() {
        let params = EnvelopeParams {
            sustain: f32::NAN,
            ..EnvelopeParams::new(0.0, 0.0, 1.0, 0.0)
        };
        let mut env = Envelope::with_params(1_000.0, params);
        assert_eq!(env.params().sustain, EnvelopeParams::default().sustain);

        env.note_on();
        let levels = tick_n(&mut env, 4);
        assert!(levels.iter().all(|l| (0.0..=1.0).contains(l)));
    }

    #[test]
    fn render_matches_individual_ticks() {
        let mut rendered = envelope(0.004, 0.004, 0.5, 0.004);
        let mut ticked = envelope(0.004, 0.004, 0.5, 0.004);
        rendered.note_on();
        ticked.note_on();

        let mut buffer = [0.0f32; 12];
        rendered.render(&mut buffer);
        assert_eq!(buffer.to_vec(), tick_n(&mut ticked, 12));
    }
}
