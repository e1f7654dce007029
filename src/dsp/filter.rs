//! # One-Pole Filters
//!
//! Both engines filter their feedback with a single pole: the ambience to
//! damp the signal entering its diffusion network, the dub delay as the
//! core of its tone control.
//!
//! ## The Recurrence
//!
//! ```text
//! y[n] = p · (y[n-1] − x[n]) + x[n]
//! ```
//!
//! which is the textbook `(1 − p)·x + p·y` rearranged to one multiply.
//! `p = 0` passes the input through; `p → 1` freezes the output. From a
//! cutoff frequency:
//!
//! ```text
//! p = e^(−2π · f_c / f_s)
//! ```
//!
//! ## Crossover Tone Control
//!
//! Splitting a signal into "lowpassed" and "original" lets a single pole
//! act as a tilt control:
//!
//! ```text
//! out = low_mix · lowpass(x) + high_mix · x
//! ```
//!
//! `low_mix = 0, high_mix = 1` is neutral, `low_mix = 1, high_mix = 0` a
//! plain lowpass. A negative `low_mix` subtracts lows, giving a
//! highpass-like shelf.

use std::f32::consts::TAU;

/// Pole of a one-pole lowpass with the given cutoff.
///
/// At 48 kHz: 10 kHz gives about 0.27, 1 kHz about 0.88, 100 Hz about
/// 0.987.
#[inline]
pub fn pole_for_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    (-TAU * cutoff_hz / sample_rate).exp()
}

/// A one-pole (6 dB/octave) lowpass.
#[derive(Debug, Clone, Default)]
pub struct OnePoleFilter {
    pole: f32,
    state: f32,
}

impl OnePoleFilter {
    /// A filter with a zero pole, i.e. a pass-through.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pole(&mut self, pole: f32) {
        self.pole = pole;
    }

    pub fn pole(&self) -> f32 {
        self.pole
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = self.pole * (self.state - input) + input;
        self.state
    }

    /// The filter memory (last output).
    pub fn state(&self) -> f32 {
        self.state
    }

    /// Snap the memory to exact zero once it has decayed below
    /// `threshold`. Returns `true` if the state is (now) zero.
    pub fn settle_below(&mut self, threshold: f32) -> bool {
        if self.state.abs() < threshold {
            self.state = 0.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// A tone control built from one lowpass pole and two mix weights.
#[derive(Debug, Clone)]
pub struct Crossover {
    lowpass: OnePoleFilter,
    low_mix: f32,
    high_mix: f32,
}

impl Default for Crossover {
    /// A neutral crossover: the input passes through unchanged.
    fn default() -> Self {
        Self {
            lowpass: OnePoleFilter::new(),
            low_mix: 0.0,
            high_mix: 1.0,
        }
    }
}

impl Crossover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pole: f32, low_mix: f32, high_mix: f32) {
        self.lowpass.set_pole(pole);
        self.low_mix = low_mix;
        self.high_mix = high_mix;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let low = self.lowpass.process(input);
        self.low_mix * low + self.high_mix * input
    }

    /// The lowpass memory.
    pub fn state(&self) -> f32 {
        self.lowpass.state()
    }

    pub fn settle_below(&mut self, threshold: f32) -> bool {
        self.lowpass.settle_below(threshold)
    }

    pub fn reset(&mut self) {
        self.lowpass.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_pole_is_transparent() {
        let mut filter = OnePoleFilter::new();
        for x in [1.0, 0.5, -0.3] {
            assert_eq!(filter.process(x), x);
        }
    }

    #[test]
    fn test_pole_for_cutoff() {
        assert_relative_eq!(pole_for_cutoff(10_000.0, 48000.0), 0.270_090, max_relative = 1e-4);
        assert_relative_eq!(pole_for_cutoff(1000.0, 48000.0), 0.877_306, max_relative = 1e-4);
        assert!(pole_for_cutoff(100.0, 48000.0) > 0.98);
    }

    /// Step response: `1 − p^(n+1)`.
    #[test]
    fn test_step_response() {
        let mut filter = OnePoleFilter::new();
        filter.set_pole(0.5);

        assert_relative_eq!(filter.process(1.0), 0.5);
        assert_relative_eq!(filter.process(1.0), 0.75);
        assert_relative_eq!(filter.process(1.0), 0.875);
        assert_eq!(filter.pole(), 0.5);
    }

    #[test]
    fn test_alternating_input_is_attenuated() {
        let mut filter = OnePoleFilter::new();
        filter.set_pole(pole_for_cutoff(100.0, 44100.0));

        let mut loudest = 0.0_f32;
        for i in 0..1000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            loudest = loudest.max(filter.process(input).abs());
        }
        assert!(loudest < 0.05, "got {loudest}");
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = OnePoleFilter::new();
        filter.set_pole(0.9);
        filter.process(1.0);
        assert!(filter.state() > 0.0);

        filter.reset();
        assert_eq!(filter.state(), 0.0);
    }

    #[test]
    fn test_settle_below_snaps_tiny_state() {
        let mut filter = OnePoleFilter::new();
        filter.set_pole(0.5);
        filter.process(1e-9);

        assert!(!filter.settle_below(1e-10));
        for _ in 0..20 {
            filter.process(0.0);
        }
        assert!(filter.settle_below(1e-10));
        assert_eq!(filter.state(), 0.0);
    }

    #[test]
    fn test_crossover_neutral() {
        let mut tone = Crossover::new();
        tone.set(0.9, 0.0, 1.0);

        for x in [1.0, -0.25, 0.5] {
            assert_eq!(tone.process(x), x);
        }
    }

    /// A low mix of −1 cancels DC, leaving a highpass shelf.
    #[test]
    fn test_crossover_removes_lows() {
        let mut tone = Crossover::new();
        tone.set(0.5, -1.0, 1.0);

        let mut output = 1.0;
        for _ in 0..200 {
            output = tone.process(1.0);
        }
        assert!(output.abs() < 1e-4, "DC should cancel, got {output}");
    }
}
