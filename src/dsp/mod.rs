//! # DSP (Digital Signal Processing) Primitives
//!
//! The building blocks both engines are assembled from:
//!
//! - **`delay_line`**: a fixed-capacity ring buffer with integer taps and
//!   interpolated fractional reads.
//! - **`filter`**: one-pole lowpass and the crossover tone control built
//!   on it.
//! - **`limiter`**: peak envelope limiter for feedback paths.
//! - **`lfo`**: decimated sine LFO.
//! - **`guard`**: denormal settling and output sanitizing.

pub mod delay_line;
pub mod filter;
pub mod guard;
pub mod lfo;
pub mod limiter;
