//! One-shot effect pulse fired by an external trigger counter.
//!
//! Any change of the observed trigger value starts (or restarts) a pulse.
//! While active the envelope emits `sin(progress * PI)`, rising from 0 to 1
//! at the midpoint and back to 0 at expiry, after which it deactivates itself.

use std::f32::consts::PI;

use crate::params::EnvelopeParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Inactive,
    Active,
}

/// Effect envelope (times in seconds)
#[derive(Debug, Clone)]
pub struct EffectEnvelope {
    active: bool,
    start_time: f32,
    /// Last observed trigger value
    trigger_id: u64,
    duration: f32,
}

impl Default for EffectEnvelope {
    fn default() -> Self {
        Self::new(EnvelopeParams::default())
    }
}

impl EffectEnvelope {
    /// Inactive envelope whose last observed trigger is 0
    pub fn new(params: EnvelopeParams) -> Self {
        Self {
            active: false,
            start_time: 0.0,
            trigger_id: 0,
            duration: params.duration_s.max(f32::EPSILON),
        }
    }

    /// Fire a pulse if `trigger` differs from the last observed value.
    ///
    /// Returns true when a pulse was (re)started.
    pub fn observe(&mut self, trigger: u64, now: f32) -> bool {
        if trigger == self.trigger_id {
            return false;
        }
        self.trigger_id = trigger;
        self.trigger(now);
        true
    }

    /// Start the pulse at `now`, restarting it if already running
    pub fn trigger(&mut self, now: f32) {
        self.active = true;
        self.start_time = now;
    }

    /// Expire the pulse if its duration has elapsed, then return the value at `now`
    pub fn advance(&mut self, now: f32) -> f32 {
        if self.active && now - self.start_time >= self.duration {
            self.active = false;
        }
        self.value(now)
    }

    /// Pulse progress in [0, 1]; exactly 0 when inactive
    pub fn progress(&self, now: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Envelope value `sin(progress * PI)`; 0 when inactive
    pub fn value(&self, now: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        (self.progress(now) * PI).sin().max(0.0)
    }

    pub fn state(&self) -> EnvelopeState {
        if self.active {
            EnvelopeState::Active
        } else {
            EnvelopeState::Inactive
        }
    }

    pub fn trigger_id(&self) -> u64 {
        self.trigger_id
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_inactive() {
        let mut envelope = EffectEnvelope::default();
        assert_eq!(envelope.state(), EnvelopeState::Inactive);
        assert_eq!(envelope.advance(10.0), 0.0);
        assert_eq!(envelope.progress(10.0), 0.0);
    }

    #[test]
    fn test_unchanged_trigger_does_not_fire() {
        let mut envelope = EffectEnvelope::default();
        assert!(!envelope.observe(0, 1.0));
        assert_eq!(envelope.state(), EnvelopeState::Inactive);
    }

    #[test]
    fn test_single_pulse_shape() {
        let mut envelope = EffectEnvelope::default();
        assert!(envelope.observe(1, 0.0));

        assert_eq!(envelope.advance(0.0), 0.0);
        assert!((envelope.advance(1.25) - 1.0).abs() < 1e-6);
        assert!(envelope.advance(2.4) > 0.0);
        assert_eq!(envelope.state(), EnvelopeState::Active);

        assert_eq!(envelope.advance(2.5), 0.0);
        assert_eq!(envelope.state(), EnvelopeState::Inactive);

        // Stays off until the trigger changes again
        assert_eq!(envelope.advance(100.0), 0.0);
        assert!(!envelope.observe(1, 100.0));
        assert_eq!(envelope.advance(101.0), 0.0);
    }

    #[test]
    fn test_progress_bounds() {
        let mut envelope = EffectEnvelope::default();
        envelope.trigger(5.0);

        for step in 0..=25 {
            let now = 5.0 + step as f32 * 0.1;
            let progress = envelope.progress(now);
            assert!((0.0..=1.0).contains(&progress));
            let value = envelope.advance(now);
            assert!((0.0..=1.0).contains(&value));
        }
        assert_eq!(envelope.progress(7.6), 0.0);
    }

    #[test]
    fn test_retrigger_restarts_pulse() {
        let mut envelope = EffectEnvelope::default();
        envelope.observe(1, 0.0);
        assert!(envelope.advance(1.0) > 0.9);

        // Re-trigger at 1s: value restarts from the curve's start
        assert!(envelope.observe(2, 1.0));
        assert_eq!(envelope.advance(1.0), 0.0);
        assert!((envelope.advance(2.25) - 1.0).abs() < 1e-6);

        // Original pulse would have ended at 2.5s; restarted one is still live
        assert!(envelope.advance(3.0) > 0.0);
        assert_eq!(envelope.advance(3.5), 0.0);
        assert_eq!(envelope.state(), EnvelopeState::Inactive);
    }

    #[test]
    fn test_any_change_fires_including_wraparound() {
        let mut envelope = EffectEnvelope::default();
        envelope.observe(u64::MAX, 0.0);
        envelope.advance(3.0);
        assert_eq!(envelope.state(), EnvelopeState::Inactive);

        assert!(envelope.observe(0, 3.0));
        assert_eq!(envelope.state(), EnvelopeState::Active);
        assert_eq!(envelope.trigger_id(), 0);
    }
}
