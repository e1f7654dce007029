//! # Stability Guard
//!
//! Recursive filters never quite reach zero on their own. After the input
//! goes silent their state keeps shrinking through the denormal range,
//! where arithmetic can be many times slower on some CPUs. Once a state
//! variable decays below [`SETTLE_THRESHOLD`] the engines snap it to
//! exact zero, and the guard remembers that the engine has gone quiet so
//! a flush runs once, not every block.
//!
//! The second half of this module is the output sanitizer. It is the last
//! thing every sample passes through before it leaves the processor.

/// Filter or envelope memory below this magnitude is treated as silence.
pub const SETTLE_THRESHOLD: f32 = 1.0e-10;

/// Tracks the quiet/active transition of an engine.
#[derive(Debug, Clone, Default)]
pub struct StabilityGuard {
    settled: bool,
}

impl StabilityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report whether the engine's memory was quiet at the end of this
    /// block. Returns `true` only for the first quiet block after an
    /// active one, which is when the caller should flush.
    pub fn observe(&mut self, quiet: bool) -> bool {
        let first_quiet_block = quiet && !self.settled;
        self.settled = quiet;
        first_quiet_block
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn reset(&mut self) {
        self.settled = false;
    }
}

/// Make an output sample safe to hand to the host.
///
/// `NaN` and infinities always become silence. In debug builds anything
/// louder than twice full scale is treated as screaming feedback and
/// silenced too, and samples between one and two times full scale are
/// hard-clamped to ±1.
#[inline]
pub fn sanitize_sample(sample: f32) -> f32 {
    if !sample.is_finite() {
        return 0.0;
    }

    if cfg!(debug_assertions) {
        if sample.abs() > 2.0 {
            return 0.0;
        }
        return sample.clamp(-1.0, 1.0);
    }

    sample
}

/// Run [`sanitize_sample`] over every channel of a block.
pub fn sanitize_block(block: &mut [&mut [f32]]) {
    for channel in block.iter_mut() {
        for sample in channel.iter_mut() {
            *sample = sanitize_sample(*sample);
        }
    }
}
