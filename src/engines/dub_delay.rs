//! # Dub Delay — Modulated Feedback Delay
//!
//! A long tape-style echo: up to 16 seconds of delay, a tone control and a
//! limiter inside the feedback loop, and a slow LFO wobbling the delay
//! length.
//!
//! ## Signal Flow
//!
//! ```text
//!  in ──┬──────────────────────────────────────────────── × dry ──►(+)──► out
//!       │                                                          ▲
//!       └─►(+)──► [tone] ──► [limiter] ──► [delay line] ──┬─ × wet ┘
//!           ▲                                  ▲          │
//!           │                               [LFO + glide] │
//!           └──────────────── × feedback ─────────────────┘
//! ```
//!
//! ## Delay Modulation
//!
//! Computing the modulated delay length every sample is wasted work: the
//! LFO is slow and the length is smoothed anyway. Every [`UPDATE_INTERVAL`]
//! samples the engine nudges a target length toward
//!
//! ```text
//! desired − mod · (1 + sin φ)
//! ```
//!
//! and works out a per-sample step that walks the smoothed length to the
//! new target by the next update. Changing the delay knob therefore
//! glides the read head instead of jumping, which is what gives the pitch
//! swoop of a tape echo.
//!
//! ## Feedback Limiting
//!
//! Feedback can be set past unity (up to 110 %). The limiter divides by
//! its envelope whenever the envelope exceeds 1, so runaway repeats are
//! caught and either clipped ("Limit", fast release) or squashed
//! ("Saturate", slow release).

use std::num::NonZeroUsize;

use nih_plug::prelude::{Enum, Smoother, SmoothingStyle};

use crate::coefficients::{db_to_gain, mix_gains, tone_cutoff, Coefficients};
use crate::dsp::delay_line::DelayLine;
use crate::dsp::filter::{pole_for_cutoff, Crossover};
use crate::dsp::guard::{StabilityGuard, SETTLE_THRESHOLD};
use crate::dsp::lfo::Lfo;
use crate::dsp::limiter::PeakLimiter;
use crate::error::{Error, Result};
use crate::params::{ParamRange, ParamSpec, ParameterStore};
use crate::processor::{BlockProcessor, Engine};

/// Parameter indices into [`PARAMS`].
pub const DELAY: usize = 0;
pub const FEEDBACK: usize = 1;
pub const FEEDBACK_MODE: usize = 2;
pub const FEEDBACK_TONE: usize = 3;
pub const LFO_DEPTH: usize = 4;
pub const LFO_RATE: usize = 5;
pub const WET_MIX: usize = 6;
pub const OUTPUT: usize = 7;

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        id: "delay",
        name: "Delay",
        range: ParamRange::Linear { min: 0.0, max: MAX_DELAY_SECONDS },
        default: 5.0,
        unit: "s",
        step: 0.001,
    },
    ParamSpec {
        id: "feedback",
        name: "Feedback",
        range: ParamRange::Linear { min: 0.0, max: 100.0 },
        default: 50.0,
        unit: "%",
        step: 1.0,
    },
    ParamSpec {
        id: "feedbackMode",
        name: "Feedback Mode",
        range: ParamRange::Choice { labels: &["Limit", "Saturate"] },
        default: 1.0,
        unit: "",
        step: 1.0,
    },
    ParamSpec {
        id: "feedbackTone",
        name: "Feedback Tone",
        range: ParamRange::Linear { min: 0.0, max: 1.0 },
        default: 0.4,
        unit: "",
        step: 0.01,
    },
    ParamSpec {
        id: "lfoDepth",
        name: "LFO Depth",
        range: ParamRange::Linear { min: 0.0, max: 100.0 },
        default: 0.0,
        unit: "%",
        step: 1.0,
    },
    ParamSpec {
        id: "lfoRate",
        name: "LFO Rate",
        range: ParamRange::Exponential { min: 0.01, max: 10.0 },
        default: 0.316_227_77,
        unit: "Hz",
        step: 0.01,
    },
    ParamSpec {
        id: "wetMix",
        name: "Wet Mix",
        range: ParamRange::Linear { min: 0.0, max: 100.0 },
        default: 50.0,
        unit: "%",
        step: 1.0,
    },
    ParamSpec {
        id: "output",
        name: "Output Level",
        range: ParamRange::Linear { min: -24.0, max: 6.0 },
        default: 0.0,
        unit: "dB",
        step: 0.1,
    },
];

/// Longest delay the line is sized for.
pub const MAX_DELAY_SECONDS: f32 = 16.0;

/// Samples between modulation updates.
pub const UPDATE_INTERVAL: usize = 100;

/// Fraction of the remaining distance the target moves per update.
const GLIDE: f32 = 0.01;

/// Peak modulation as a fraction of the delay length at 100 % depth.
const MOD_SCALE: f32 = 0.049;

/// Feedback at 100 % on the knob.
const FEEDBACK_CEILING: f32 = 1.1;

/// Extra samples past the longest delay so the interpolated read always
/// has both neighbours.
const INTERPOLATION_HEADROOM: usize = 2;

const OUTPUT_SMOOTHING_MS: f32 = 50.0;

/// How the feedback limiter recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum FeedbackMode {
    /// Fast release. Clips the peaks of runaway repeats.
    #[id = "limit"]
    Limit,
    /// Slow release. Compresses the whole echo.
    #[id = "saturate"]
    Saturate,
}

impl Default for FeedbackMode {
    fn default() -> Self {
        Self::Saturate
    }
}

impl FeedbackMode {
    /// Decode the stored choice index.
    pub fn from_value(value: f32) -> Self {
        if value.round() < 1.0 {
            Self::Limit
        } else {
            Self::Saturate
        }
    }

    /// Envelope release factor per sample.
    pub fn release(self) -> f32 {
        match self {
            Self::Limit => 0.8,
            Self::Saturate => 0.9997,
        }
    }
}

/// Longest usable delay in samples at `sample_rate`.
pub fn max_delay_samples(sample_rate: f32) -> usize {
    (MAX_DELAY_SECONDS * sample_rate).ceil() as usize
}

/// Crossover settings for a tone value `t ∈ [0, 1]`: `(cutoff_t, low_mix,
/// high_mix)`.
///
/// Below the midpoint the high band fades out and the lowpass fades in,
/// so repeats get darker. Above it the lowpass is subtracted, leaving a
/// highpass-ish tilt. At exactly 0.5 the crossover passes the signal
/// unchanged.
pub fn tone_mix(tone: f32) -> (f32, f32, f32) {
    if tone > 0.5 {
        let c = 0.5 * tone - 0.25;
        (c, -2.0 * c, 1.0)
    } else {
        let high = 2.0 * tone;
        (tone, 1.0 - high, high)
    }
}

/// Derived coefficients for the dub delay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DubDelayCoefficients {
    /// Desired delay in samples, clamped to `[1, max_delay_samples]`.
    pub delay_samples: f32,
    /// Peak LFO excursion in samples.
    pub modulation: f32,
    /// Linear feedback gain, up to 1.1.
    pub feedback: f32,
    /// Selects the limiter release.
    pub mode: FeedbackMode,
    /// Tone lowpass pole.
    pub pole: f32,
    /// Weight of the lowpassed feedback. Negative above the tone midpoint.
    pub low_mix: f32,
    /// Weight of the unfiltered feedback.
    pub high_mix: f32,
    /// LFO phase step per modulation update.
    pub lfo_increment: f32,
    /// Gain on each channel's own input, before the output level.
    pub dry: f32,
    /// Gain on the shared echo, before the output level.
    pub wet: f32,
    /// Output level target for the smoother.
    pub output_gain: f32,
}

impl Coefficients for DubDelayCoefficients {
    fn derive(params: &ParameterStore, sample_rate: f32) -> Self {
        let max_delay = max_delay_samples(sample_rate) as f32;
        let delay_samples = (params.value(DELAY) * sample_rate).clamp(1.0, max_delay.max(1.0));

        let (cutoff_t, low_mix, high_mix) = tone_mix(params.value(FEEDBACK_TONE));
        let gains = mix_gains(params.value(WET_MIX) / 100.0, 1.0);

        Self {
            delay_samples,
            modulation: MOD_SCALE * params.value(LFO_DEPTH) / 100.0 * delay_samples,
            feedback: FEEDBACK_CEILING * params.value(FEEDBACK) / 100.0,
            mode: FeedbackMode::from_value(params.value(FEEDBACK_MODE)),
            pole: pole_for_cutoff(tone_cutoff(cutoff_t), sample_rate),
            low_mix,
            high_mix,
            lfo_increment: Lfo::increment_for(params.value(LFO_RATE), sample_rate, UPDATE_INTERVAL),
            dry: gains.dry,
            wet: gains.wet,
            output_gain: db_to_gain(params.value(OUTPUT)),
        }
    }
}

impl DubDelayCoefficients {
    /// Samples until the echo train has decayed by 60 dB. `None` when the
    /// feedback is at or past unity and the limiter holds it up forever.
    pub fn tail_samples(&self) -> Option<u32> {
        if self.feedback >= 1.0 {
            return None;
        }
        if self.feedback <= 0.001 {
            return Some(self.delay_samples as u32);
        }

        let repeats = 0.001_f32.ln() / self.feedback.ln();
        Some((repeats * self.delay_samples).min(u32::MAX as f32) as u32)
    }
}

/// The dub delay engine: one mono feedback core shared by every channel.
pub struct DubDelayEngine {
    line: DelayLine,
    tone: Crossover,
    limiter: PeakLimiter,
    lfo: Lfo,
    output: Smoother<f32>,
    coefficients: DubDelayCoefficients,

    /// Delay length the glide is heading for.
    target: f32,
    /// Delay length the read head is at.
    smoothed: f32,
    /// Per-sample change of `smoothed` until the next update.
    step: f32,
    /// Samples left until the next modulation update.
    countdown: usize,
    /// `false` until the first update after a reset.
    primed: bool,

    guard: StabilityGuard,
    sample_rate: f32,
}

impl Default for DubDelayEngine {
    fn default() -> Self {
        Self {
            line: DelayLine::new(),
            tone: Crossover::new(),
            limiter: PeakLimiter::new(FeedbackMode::Saturate.release()),
            lfo: Lfo::new(),
            output: Smoother::new(SmoothingStyle::Linear(OUTPUT_SMOOTHING_MS)),
            coefficients: DubDelayCoefficients::default(),
            target: 0.0,
            smoothed: 0.0,
            step: 0.0,
            countdown: 0,
            primed: false,
            guard: StabilityGuard::new(),
            sample_rate: 0.0,
        }
    }
}

impl DubDelayEngine {
    /// Current read-head position in samples.
    pub fn delay_length(&self) -> f32 {
        self.smoothed
    }

    pub fn target_length(&self) -> f32 {
        self.target
    }

    pub fn capacity(&self) -> usize {
        self.line.capacity()
    }

    /// `true` once the feedback filter and limiter have decayed to zero.
    pub fn is_settled(&self) -> bool {
        self.guard.is_settled()
    }

    /// Move the glide target one step and recompute the per-sample step.
    fn update_modulation(&mut self) {
        let c = &self.coefficients;
        let swing = c.modulation * (1.0 + self.lfo.value());

        if self.primed {
            self.target += GLIDE * (c.delay_samples - self.target - swing);
        } else {
            // Start at the steady state instead of gliding up from zero.
            self.target = c.delay_samples - swing;
            self.smoothed = self.target;
            self.primed = true;
        }

        self.step = (self.target - self.smoothed) / UPDATE_INTERVAL as f32;
        self.lfo.advance();
        self.countdown = UPDATE_INTERVAL;
    }
}

impl Engine for DubDelayEngine {
    type Coefficients = DubDelayCoefficients;

    const PARAMS: &'static [ParamSpec] = PARAMS;

    fn allocate(&mut self, sample_rate: f32) -> Result<()> {
        let capacity = max_delay_samples(sample_rate)
            .checked_add(INTERPOLATION_HEADROOM)
            .and_then(NonZeroUsize::new)
            .ok_or(Error::InvalidSampleRate(sample_rate))?;

        self.line.allocate(capacity)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    fn apply(&mut self, coefficients: &DubDelayCoefficients) {
        self.coefficients = *coefficients;

        self.tone
            .set(coefficients.pole, coefficients.low_mix, coefficients.high_mix);
        self.limiter.set_release(coefficients.mode.release());
        self.lfo.set_increment(coefficients.lfo_increment);

        if self.primed {
            self.output
                .set_target(self.sample_rate, coefficients.output_gain);
        } else {
            self.output.reset(coefficients.output_gain);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.tone.reset();
        self.limiter.reset();
        self.lfo.reset();
        self.output.reset(self.coefficients.output_gain);

        self.target = 0.0;
        self.smoothed = 0.0;
        self.step = 0.0;
        self.countdown = 0;
        self.primed = false;
        self.guard.reset();
    }

    fn process(&mut self, block: &mut [&mut [f32]]) {
        let Some(len) = block.iter().map(|channel| channel.len()).min() else {
            return;
        };

        let feedback = self.coefficients.feedback;
        let (dry, wet) = (self.coefficients.dry, self.coefficients.wet);

        for i in 0..len {
            if self.countdown == 0 {
                self.update_modulation();
            }
            self.countdown -= 1;
            self.smoothed += self.step;

            let delayed = self.line.read(self.smoothed.max(1.0));

            let x = block[0][i] + feedback * delayed;
            let x = self.tone.process(x);
            let x = self.limiter.process(x);
            self.line.write(x);
            self.line.advance();

            let gain = self.output.next();
            let echo = gain * wet * delayed;
            for channel in block.iter_mut() {
                channel[i] = gain * dry * channel[i] + echo;
            }
        }
    }

    /// Snap the decayed tone and envelope memory. The delay line keeps its
    /// contents: the echoes are far longer than the filter decay. Only a
    /// fault clears the line, since it would recirculate forever.
    fn settle(&mut self) {
        if self.has_fault() {
            self.line.clear();
            self.tone.reset();
            self.limiter.reset();
            return;
        }

        let tone_quiet = self.tone.settle_below(SETTLE_THRESHOLD);
        let envelope_quiet = self.limiter.settle_below(SETTLE_THRESHOLD);
        self.guard.observe(tone_quiet && envelope_quiet);
    }

    /// Everything written to the line passes the tone filter first, and a
    /// non-finite sample leaves its lowpass state non-finite for good.
    fn has_fault(&self) -> bool {
        !(self.tone.state().is_finite() && self.limiter.envelope().is_finite())
    }

    fn tail_samples(&self) -> Option<u32> {
        self.coefficients.tail_samples()
    }
}

/// The dub delay driven block by block from its parameter store.
pub type DubDelay = BlockProcessor<DubDelayEngine>;
