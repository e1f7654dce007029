//! # Effect Engines
//!
//! - **`ambience`**: four-stage allpass diffusion reverb.
//! - **`dub_delay`**: modulated long delay with a tone filter and limiter
//!   in the feedback loop.
//!
//! Each module exports its parameter table, its coefficient set, its
//! engine and a ready-to-use `BlockProcessor` alias.

pub mod ambience;
pub mod dub_delay;
