//! # Decimated LFO
//!
//! A sine LFO whose phase is only advanced on a decimated schedule (every
//! `interval` samples) instead of every sample. The modulation it drives
//! is smoothed afterwards anyway, so evaluating `sin()` 100 times less
//! often costs nothing audible.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Default)]
pub struct Lfo {
    /// Phase in radians, always in `[0, 2π)`.
    phase: f32,
    /// Phase step per update (not per sample).
    increment: f32,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase increment for one update every `interval` samples.
    pub fn increment_for(rate_hz: f32, sample_rate: f32, interval: usize) -> f32 {
        TAU * rate_hz * interval as f32 / sample_rate
    }

    pub fn set_increment(&mut self, increment: f32) {
        self.increment = increment;
    }

    /// Current value in `[-1, 1]`.
    #[inline]
    pub fn value(&self) -> f32 {
        self.phase.sin()
    }

    /// Step the phase by one update. The increment may exceed a full
    /// cycle at very low sample rates, so the wrap is a true modulo.
    #[inline]
    pub fn advance(&mut self) {
        self.phase = (self.phase + self.increment).rem_euclid(TAU);
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_formula() {
        // 1 Hz at 48 kHz, updated every 100 samples: 480 updates per cycle.
        let inc = Lfo::increment_for(1.0, 48000.0, 100);
        assert!((inc - TAU / 480.0).abs() < 1e-6);
    }

    #[test]
    fn test_phase_wraps() {
        let mut lfo = Lfo::new();
        lfo.set_increment(Lfo::increment_for(10.0, 48000.0, 100));

        for _ in 0..10_000 {
            lfo.advance();
            assert!((0.0..TAU).contains(&lfo.phase()));
        }
    }

    /// 10 Hz updated every 100 samples at 500 Hz is two full cycles per
    /// update.
    #[test]
    fn test_phase_wraps_large_increment() {
        let mut lfo = Lfo::new();
        let increment = Lfo::increment_for(10.0, 500.0, 100);
        assert!(increment > TAU);
        lfo.set_increment(increment + 0.5);

        for _ in 0..1000 {
            lfo.advance();
            assert!((0.0..TAU).contains(&lfo.phase()), "{}", lfo.phase());
        }
    }

    #[test]
    fn test_starts_at_zero_and_resets() {
        let mut lfo = Lfo::new();
        assert_eq!(lfo.value(), 0.0);

        lfo.set_increment(1.0);
        lfo.advance();
        assert!((lfo.value() - 1.0_f32.sin()).abs() < 1e-6);

        lfo.reset();
        assert_eq!(lfo.phase(), 0.0);
    }
}
