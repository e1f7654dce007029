//! # Errors
//!
//! Only the non-real-time calls can fail: `prepare()` (buffer allocation,
//! bad configuration) and parameter lookups by name. The audio path never
//! returns an error for bad samples; it recovers locally instead (see
//! [`crate::dsp::guard`]). The single exception is calling `process()`
//! before a successful `prepare()`, which is reported so the caller knows
//! the block was silenced rather than processed.

use std::collections::TryReserveError;

use thiserror::Error;

/// Everything that can go wrong outside the per-sample loop.
#[derive(Debug, Error)]
pub enum Error {
    /// A delay buffer could not be allocated during `prepare()`.
    #[error("failed to allocate a delay buffer of {samples} samples")]
    Allocation {
        samples: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    #[error("maximum block size must be at least one sample")]
    InvalidBlockSize,

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// `process()` was called before `prepare()` succeeded. The block has
    /// been filled with silence.
    #[error("engine has not been prepared")]
    NotPrepared,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
