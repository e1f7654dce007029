//! # Peak Limiter
//!
//! Keeps a feedback loop from running away. An envelope follower tracks
//! the peak of the signal; whenever the envelope rises above unity the
//! sample is divided by it.
//!
//! ```text
//! e = max(|x|, e * release)
//! y = x / e   if e > 1
//! y = x       otherwise
//! ```
//!
//! The release factor sets the character. A fast release (0.8) recovers
//! within a few samples, so only the peaks get flattened and it behaves
//! like a clipper. A slow release (0.9997) holds the gain reduction for
//! thousands of samples, which squashes the whole echo like a compressor
//! and lets it saturate gradually.

/// Peak-normalizing limiter with a one-multiply envelope.
#[derive(Debug, Clone)]
pub struct PeakLimiter {
    envelope: f32,
    release: f32,
}

impl PeakLimiter {
    pub fn new(release: f32) -> Self {
        Self {
            envelope: 0.0,
            release,
        }
    }

    pub fn set_release(&mut self, release: f32) {
        self.release = release;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        self.envelope *= self.release;
        if level > self.envelope {
            self.envelope = level;
        }

        if self.envelope > 1.0 {
            input / self.envelope
        } else {
            input
        }
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    /// Snap a decayed envelope to zero. Returns `true` if it is zero.
    pub fn settle_below(&mut self, threshold: f32) -> bool {
        if self.envelope < threshold {
            self.envelope = 0.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
