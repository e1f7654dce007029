//! # Ambience — Diffusion Reverb
//!
//! A small-room reverb made from four allpass stages in series. There is
//! no feedback around the whole network; the density comes from each
//! stage smearing its input over time and the next stage smearing that
//! again.
//!
//! ## Signal Flow
//!
//! ```text
//!  L ──┬────────────────────────────────────────────── × dry ──►(+)──► L'
//!      │                                                          ▲
//!      ├─(+)─► × wet ─► [damping] ──f──┬─► AP1 ─► AP2 ─► AP3 ─r─►(−f)
//!      │  ▲                            │                 │
//!  R ──┼──┘                            │                 └─► AP4 ─r─►(−f)
//!      │                                                          │
//!      └──────────────────────────────────────────────── × dry ─►(+)──► R'
//! ```
//!
//! The left output is tapped after the third stage and the right output
//! after the fourth, so both channels come from the same diffusion core
//! but arrive decorrelated.
//!
//! ## Allpass Stage
//!
//! ```text
//! t = line[d samples ago]
//! r = r − 0.8·t      (written into the line)
//! r = r + t          (passed on)
//! ```
//!
//! The feedback constant is fixed below 1, so the chain is stable for
//! every parameter value. Subtracting `f` at the outputs removes the
//! undiffused direct path, leaving only the reverberant part.

use std::num::NonZeroUsize;

use crate::coefficients::{db_to_gain, mix_gains, Coefficients};
use crate::dsp::delay_line::DelayLine;
use crate::dsp::filter::OnePoleFilter;
use crate::dsp::guard::{StabilityGuard, SETTLE_THRESHOLD};
use crate::error::Result;
use crate::params::{ParamRange, ParamSpec, ParameterStore};
use crate::processor::{BlockProcessor, Engine};

/// Parameter indices into [`PARAMS`].
pub const SIZE: usize = 0;
pub const HF: usize = 1;
pub const MIX: usize = 2;
pub const OUTPUT: usize = 3;

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        id: "size",
        name: "Size",
        range: ParamRange::Linear { min: 0.0, max: 10.0 },
        default: 7.0,
        unit: "m",
        step: 0.1,
    },
    ParamSpec {
        id: "hf",
        name: "HF Damping",
        range: ParamRange::Linear { min: 0.0, max: 100.0 },
        default: 70.0,
        unit: "%",
        step: 1.0,
    },
    ParamSpec {
        id: "mix",
        name: "Mix",
        range: ParamRange::Linear { min: 0.0, max: 100.0 },
        default: 70.0,
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

/// Every allpass line holds 1024 samples. The longest tap at maximum
/// size is 379 · 2.69 ≈ 1019 samples.
pub const LINE_CAPACITY: usize = 1024;

const LINE_CAPACITY_NZ: NonZeroUsize = match NonZeroUsize::new(LINE_CAPACITY) {
    Some(capacity) => capacity,
    None => panic!("allpass lines need a non-zero capacity"),
};

/// Allpass feedback, fixed below 1.
pub const FEEDBACK: f32 = 0.8;

/// Tap lengths in samples at a size coefficient of 1. Mutually far from
/// common multiples so the echoes don't pile up on each other.
pub const TAP_BASES: [f32; 4] = [107.0, 142.0, 277.0, 379.0];

/// Derived coefficients for the ambience.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbienceCoefficients {
    /// Tap length multiplier, `0.025 + 2.665 · size/10`.
    pub size: f32,
    /// Damping filter step `d` in `f += d·(x − f)`.
    pub damping: f32,
    /// Gain on each channel's own input.
    pub dry: f32,
    /// Gain on the summed input feeding the network.
    pub wet: f32,
}

impl Coefficients for AmbienceCoefficients {
    fn derive(params: &ParameterStore, _sample_rate: f32) -> Self {
        let gains = mix_gains(
            params.value(MIX) / 100.0,
            db_to_gain(params.value(OUTPUT)),
        );

        Self {
            size: 0.025 + 2.665 * params.value(SIZE) / 10.0,
            damping: 0.05 + 0.9 * params.value(HF) / 100.0,
            dry: gains.dry,
            wet: gains.wet,
        }
    }
}

impl AmbienceCoefficients {
    /// The four allpass delays in samples.
    pub fn tap_delays(&self) -> [usize; 4] {
        TAP_BASES.map(|base| (base * self.size) as usize)
    }
}

/// Whether the lines still hold audio recorded at a different size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushState {
    NeedsFlush,
    Ready,
}

/// The ambience engine: four allpass lines plus the damping filter.
#[derive(Debug)]
pub struct AmbienceEngine {
    lines: [DelayLine; 4],
    damping: OnePoleFilter,
    taps: [usize; 4],
    size: f32,
    dry: f32,
    wet: f32,
    state: FlushState,
    guard: StabilityGuard,
}

impl Default for AmbienceEngine {
    fn default() -> Self {
        Self {
            lines: Default::default(),
            damping: OnePoleFilter::new(),
            taps: [0; 4],
            size: 0.0,
            dry: 0.0,
            wet: 0.0,
            state: FlushState::NeedsFlush,
            guard: StabilityGuard::new(),
        }
    }
}

impl AmbienceEngine {
    pub fn taps(&self) -> [usize; 4] {
        self.taps
    }

    /// `true` when a size change is waiting to flush the lines.
    pub fn needs_flush(&self) -> bool {
        self.state == FlushState::NeedsFlush
    }

    /// Current damping filter memory.
    pub fn damping_state(&self) -> f32 {
        self.damping.state()
    }

    /// Zero the lines and the damping filter.
    fn flush(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.damping.reset();
        self.state = FlushState::Ready;
    }
}

impl Engine for AmbienceEngine {
    type Coefficients = AmbienceCoefficients;

    const PARAMS: &'static [ParamSpec] = PARAMS;

    /// The lines have a fixed size, so the sample rate only matters for
    /// the first allocation.
    fn allocate(&mut self, _sample_rate: f32) -> Result<()> {
        for line in &mut self.lines {
            line.allocate(LINE_CAPACITY_NZ)?;
        }
        self.flush();
        Ok(())
    }

    fn apply(&mut self, coefficients: &AmbienceCoefficients) {
        // Audio in the lines was recorded with the old tap spacing.
        if coefficients.size != self.size {
            self.state = FlushState::NeedsFlush;
        }

        self.size = coefficients.size;
        self.taps = coefficients.tap_delays();
        self.damping.set_pole(1.0 - coefficients.damping);
        self.dry = coefficients.dry;
        self.wet = coefficients.wet;
    }

    fn reset(&mut self) {
        self.flush();
        self.guard.reset();
    }

    fn process(&mut self, block: &mut [&mut [f32]]) {
        if self.state == FlushState::NeedsFlush {
            self.flush();
        }

        // A mono bus feeds its one channel into both halves of the sum
        // and receives the left output.
        let Some((left, rest)) = block.split_first_mut() else {
            return;
        };
        let mut right = rest.first_mut();
        let len = right
            .as_ref()
            .map_or(left.len(), |channel| channel.len().min(left.len()));

        let [d1, d2, d3, d4] = self.taps;
        let [line1, line2, line3, line4] = &mut self.lines;
        let (dry, wet) = (self.dry, self.wet);

        for i in 0..len {
            let a = left[i];
            let b = right.as_ref().map_or(a, |channel| channel[i]);

            let f = self.damping.process(wet * (a + b));

            let mut r = allpass(line1, d1, f);
            r = allpass(line2, d2, r);
            r = allpass(line3, d3, r);
            left[i] = dry * a + r - f;

            r = allpass(line4, d4, r);
            if let Some(channel) = right.as_mut() {
                channel[i] = dry * b + r - f;
            }

            line1.advance();
            line2.advance();
            line3.advance();
            line4.advance();
        }
    }

    /// Once the damping filter has died away, flush the whole network so
    /// nothing keeps recirculating at denormal levels. A non-finite
    /// damping state has already spread into the lines, so it flushes too.
    fn settle(&mut self) {
        if self.has_fault() {
            self.flush();
            return;
        }

        let quiet = self.damping.settle_below(SETTLE_THRESHOLD);
        if self.guard.observe(quiet) {
            self.flush();
        }
    }

    /// Every line is fed through the damping filter, so a poisoned line
    /// always comes with a poisoned filter.
    fn has_fault(&self) -> bool {
        !self.damping.state().is_finite()
    }

    fn tail_samples(&self) -> Option<u32> {
        Some(LINE_CAPACITY as u32)
    }
}

/// One allpass step through `line` with a delay of `delay` samples.
#[inline]
fn allpass(line: &mut DelayLine, delay: usize, input: f32) -> f32 {
    let delayed = line.tap(delay);
    let r = input - FEEDBACK * delayed;
    line.write(r);
    r + delayed
}

/// The ambience reverb driven block by block from its parameter store.
pub type Ambience = BlockProcessor<AmbienceEngine>;
