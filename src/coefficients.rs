//! # Coefficient Derivation
//!
//! Users think in decibels, percent and "brightness"; the per-sample
//! recurrences want linear gains and filter poles. This module holds the
//! conversion rules shared by both engines and the [`Coefficients`] trait
//! each engine's coefficient set implements.
//!
//! Coefficients are derived at most once per block, at the block
//! boundary, and only when the parameter store reports a change. Between
//! derivations the previous set stays in force, so a block is always
//! processed with one consistent set of coefficients.

use nih_plug::util;

use crate::params::ParameterStore;

/// A complete set of derived DSP coefficients for one engine.
///
/// `derive` must be a pure function of the current parameter values and
/// the sample rate: no allocation, no side effects, the same inputs
/// always give the same coefficients.
pub trait Coefficients: Copy + Default {
    fn derive(params: &ParameterStore, sample_rate: f32) -> Self;
}

/// Convert an output level in decibels to a linear multiplier
/// (`10^(dB/20)`).
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    util::db_to_gain(db)
}

/// Dry and wet multipliers for one output stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MixGains {
    pub dry: f32,
    pub wet: f32,
}

/// Shaped wet/dry crossfade.
///
/// ```text
/// dry = g * (1 - m²)
/// wet = g * (1 - (1 - m)²)
/// ```
///
/// Both legs stay near full level around the middle of the knob instead
/// of dipping like a linear crossfade: at `m = 0.5` each is at 0.75.
#[inline]
pub fn mix_gains(mix: f32, gain: f32) -> MixGains {
    let m = mix.clamp(0.0, 1.0);
    let inverse = 1.0 - m;
    MixGains {
        dry: gain * (1.0 - m * m),
        wet: gain * (1.0 - inverse * inverse),
    }
}

/// Map a normalized tone control to a cutoff frequency in Hz.
///
/// ```text
/// f_c = 10^(2.2 + 4.5 t)
/// ```
///
/// Exponential so that equal knob travel gives equal perceived change:
/// `t = 0` is about 158 Hz, `t = 0.5` about 5 kHz.
#[inline]
pub fn tone_cutoff(t: f32) -> f32 {
    10.0_f32.powf(2.2 + 4.5 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_to_gain() {
        assert_relative_eq!(db_to_gain(0.0), 1.0, max_relative = 1e-6);
        assert_relative_eq!(db_to_gain(6.0), 10.0_f32.powf(0.3), max_relative = 1e-5);
        assert_relative_eq!(db_to_gain(-24.0), 10.0_f32.powf(-1.2), max_relative = 1e-5);
    }

    #[test]
    fn test_mix_gains_shape() {
        let dry_only = mix_gains(0.0, 1.0);
        assert_eq!(dry_only, MixGains { dry: 1.0, wet: 0.0 });

        let wet_only = mix_gains(1.0, 1.0);
        assert_eq!(wet_only, MixGains { dry: 0.0, wet: 1.0 });

        let half = mix_gains(0.5, 2.0);
        assert_relative_eq!(half.dry, 1.5);
        assert_relative_eq!(half.wet, 1.5);

        let seventy = mix_gains(0.7, 1.0);
        assert_relative_eq!(seventy.dry, 0.51, max_relative = 1e-5);
        assert_relative_eq!(seventy.wet, 0.91, max_relative = 1e-5);
    }

    #[test]
    fn test_tone_cutoff_is_exponential() {
        assert_relative_eq!(tone_cutoff(0.0), 158.489_32, max_relative = 1e-4);
        assert_relative_eq!(tone_cutoff(1.0), 10.0_f32.powf(6.7), max_relative = 1e-4);
        // Equal steps multiply the frequency by the same ratio.
        let ratio_low = tone_cutoff(0.2) / tone_cutoff(0.1);
        let ratio_high = tone_cutoff(0.9) / tone_cutoff(0.8);
        assert_relative_eq!(ratio_low, ratio_high, max_relative = 1e-4);
    }
}
