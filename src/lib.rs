//! # Loveless FX — Ambience and Dub Delay
//!
//! Two effects built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! and exported from one library as CLAP, VST3 and (through clap-wrapper)
//! AUv2 plugins:
//!
//! - **Ambience**: a small-room diffusion reverb made of four allpass
//!   stages.
//! - **Dub Delay**: up to 16 seconds of modulated delay with a tone filter
//!   and a limiter inside the feedback loop.
//!
//! ## Architecture
//!
//! ```text
//!  control thread                     audio thread
//!  ──────────────                     ────────────
//!  set_parameter ──► ParameterStore ──► take_dirty? ──► Coefficients::derive
//!                    (atomics + flag)                          │
//!                                                              ▼
//!                      block in ──► Engine::process ──► settle ──► sanitize ──► block out
//! ```
//!
//! Parameters are written from any thread into a lock-free
//! [`ParameterStore`](params::ParameterStore). Once per block the
//! [`BlockProcessor`](processor::BlockProcessor) checks the store's dirty
//! flag and, only if it was set, derives a fresh coefficient set. The
//! engines themselves are plain owned values: no locks, no allocation
//! after `prepare()`.
//!
//! The effects are usable without a host through the
//! [`Effect`](processor::Effect) trait:
//!
//! ```no_run
//! use loveless_fx::{DubDelay, Effect};
//!
//! let mut delay = DubDelay::default();
//! delay.prepare(48000.0, 512)?;
//! delay.set_parameter("delay", 0.375)?;
//!
//! let mut left = vec![0.0; 512];
//! let mut right = vec![0.0; 512];
//! delay.process(&mut [&mut left, &mut right])?;
//! # Ok::<(), loveless_fx::Error>(())
//! ```

pub mod coefficients;
pub mod dsp;
pub mod engines;
pub mod error;
pub mod params;
pub mod plugin;
pub mod processor;

use nih_plug::prelude::*;

pub use engines::ambience::Ambience;
pub use engines::dub_delay::{DubDelay, FeedbackMode};
pub use error::{Error, Result};
pub use params::{ParamSnapshot, ParameterStore};
pub use plugin::{AmbiencePlugin, DubDelayPlugin};
pub use processor::{BlockProcessor, Effect, Engine};

nih_export_clap!(AmbiencePlugin, DubDelayPlugin);
nih_export_vst3!(AmbiencePlugin, DubDelayPlugin);

// AUv2 entry point for Logic Pro, generated from the CLAP factory.
clap_wrapper::export_auv2!();
