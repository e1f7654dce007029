//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. Both engines are built on it: the ambience uses
//! four short ones as allpass stages, the dub delay uses one long one as
//! its echo memory.
//!
//! ## How a Ring Buffer Works
//!
//! A `Vec<f32>` is the "tape" and an integer index is the write head.
//! Each sample:
//!
//! 1. Read the delayed sample `delay` steps behind the write head,
//!    wrapping around to the end of the buffer if we go past the start.
//! 2. Write the new sample at the write head.
//! 3. Advance the write head by 1, wrapping back to 0 at the end.
//!
//! Every index is reduced modulo the capacity, so it always lies in
//! `[0, capacity)`.
//!
//! ## Reading Ahead vs. Reading Behind
//!
//! An allpass stage is often described as "read at the cursor, write
//! `d` samples ahead of it". Reading `d` samples *behind* the cursor and
//! writing *at* the cursor is the same delay seen from the other end,
//! so a single write head serves both views.
//!
//! ## Linear Interpolation
//!
//! The dub delay glides its delay time, so the read position is usually
//! fractional. [`DelayLine::read`] blends the two stored neighbours:
//!
//! ```text
//! result = sample_a * (1 - frac) + sample_b * frac
//! ```

use std::num::NonZeroUsize;

use crate::error::{Error, Result};

/// A fixed-capacity ring buffer used as an audio delay line.
///
/// The buffer is sized in `allocate()`, which only runs from the
/// non-real-time `prepare()` call. Reads, writes and `advance()` never
/// allocate.
#[derive(Debug, Default)]
pub struct DelayLine {
    /// The circular buffer storing audio samples. Empty until
    /// `allocate()` succeeds.
    buffer: Vec<f32>,

    /// Current write position. Advances by 1 each sample, wrapping to 0
    /// at the capacity.
    write_pos: usize,
}

impl DelayLine {
    /// Create an empty delay line. Call [`allocate`](Self::allocate)
    /// before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the buffer to exactly `capacity` samples and clear it.
    ///
    /// If the capacity is unchanged the existing buffer is reused, so
    /// calling `prepare()` again at the same sample rate costs only a
    /// clear. Allocation failure is reported instead of aborting, and
    /// leaves the previous buffer in place.
    pub fn allocate(&mut self, capacity: NonZeroUsize) -> Result<()> {
        let capacity = capacity.get();

        if self.buffer.len() != capacity {
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(capacity)
                .map_err(|source| Error::Allocation {
                    samples: capacity,
                    source,
                })?;
            buffer.resize(capacity, 0.0);
            self.buffer = buffer;
        }

        self.clear();
        Ok(())
    }

    /// Number of samples the buffer holds. Zero before `allocate()`.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Write a sample at the current write position.
    ///
    /// **Important:** This does NOT advance the write position. Call
    /// [`advance()`](Self::advance) after both the read and the write for
    /// the current sample are done, so the old value can be read before
    /// it is overwritten.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
    }

    /// Read the sample written exactly `delay` steps ago.
    ///
    /// `delay` is reduced modulo the capacity. With `delay == 0` this
    /// returns the slot at the write head: the sample just written if
    /// `write()` already ran for this step, otherwise the oldest sample
    /// in the buffer.
    #[inline]
    pub fn tap(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let index = (self.write_pos + len - delay % len) % len;
        self.buffer[index]
    }

    /// Read a delayed sample at a fractional position using linear
    /// interpolation.
    ///
    /// To read N samples behind the write head in a circular buffer:
    ///
    /// ```text
    /// read_index = (write_pos + buffer_len - N) % buffer_len
    /// ```
    ///
    /// We add `buffer_len` before subtracting to avoid negative numbers.
    /// The delay is clamped to `[0, capacity - 2]` so both interpolation
    /// neighbours are real history.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let max_delay = len.saturating_sub(2) as f32;
        let delay_clamped = delay_samples.clamp(0.0, max_delay);

        // For 441.3: delay_int = 441, delay_frac = 0.3
        let delay_int = delay_clamped as usize;
        let delay_frac = delay_clamped - delay_int as f32;

        // index_a is the newer sample, index_b one step older.
        let index_a = (self.write_pos + len - delay_int) % len;
        let index_b = (self.write_pos + len - delay_int - 1) % len;

        let sample_a = self.buffer[index_a];
        let sample_b = self.buffer[index_b];

        sample_a + delay_frac * (sample_b - sample_a)
    }

    /// Advance the write position by one sample, wrapping at the capacity.
    #[inline]
    pub fn advance(&mut self) {
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Clear the buffer to silence and reset the write position.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
