//! # Host Adapters
//!
//! Thin nih-plug wrappers around the effects. The adapters own nothing
//! but a `Params` struct for the host and the [`BlockProcessor`] doing the
//! work. Every host parameter carries a callback that writes straight
//! into the effect's [`ParameterStore`], so automation takes effect at
//! the next block boundary exactly like a direct `set_parameter` call.
//!
//! [`BlockProcessor`]: crate::processor::BlockProcessor

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

use crate::error::Result;
use crate::params::{ParamRange, ParameterStore};

pub mod ambience;
pub mod dub_delay;

pub use ambience::AmbiencePlugin;
pub use dub_delay::DubDelayPlugin;

pub(crate) const VENDOR: &str = "Loveless Audio";
pub(crate) const EMAIL: &str = "steve.loveless@gmail.com";

/// Stereo first, mono as a fallback. Both effects handle either.
pub(crate) const AUDIO_IO_LAYOUTS: &[AudioIOLayout] = &[
    AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    },
    AudioIOLayout {
        main_input_channels: NonZeroU32::new(1),
        main_output_channels: NonZeroU32::new(1),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    },
];

/// Build the host-facing parameter for entry `index` of `store`'s table.
///
/// Exponential ranges become a skewed `FloatRange`; the store keeps the
/// exact mapping, the host only needs a knob that feels right.
pub(crate) fn float_param(store: &Arc<ParameterStore>, index: usize) -> FloatParam {
    let spec = store.specs()[index];

    let range = match spec.range {
        ParamRange::Linear { min, max } => FloatRange::Linear { min, max },
        ParamRange::Exponential { min, max } => FloatRange::Skewed {
            min,
            max,
            factor: FloatRange::skew_factor(-2.0),
        },
        ParamRange::Choice { labels } => FloatRange::Linear {
            min: 0.0,
            max: labels.len().saturating_sub(1) as f32,
        },
    };

    let unit = spec.unit;
    let decimals = display_decimals(spec.step);
    let target = store.clone();

    let mut param = FloatParam::new(spec.name, spec.default, range)
        .with_callback(Arc::new(move |value: f32| {
            target.set_value(index, value);
        }))
        .with_value_to_string(Arc::new(move |value: f32| {
            if unit.is_empty() {
                format!("{value:.decimals$}")
            } else {
                format!("{value:.decimals$} {unit}")
            }
        }))
        .with_string_to_value(Arc::new(move |text: &str| {
            text.trim().trim_end_matches(unit).trim().parse::<f32>().ok()
        }));

    if spec.step > 0.0 {
        param = param.with_step_size(spec.step);
    }
    param
}

/// Decimal places needed to show a value with the given step size.
fn display_decimals(step: f32) -> usize {
    if step >= 1.0 {
        0
    } else if step > 0.0 {
        (-step.log10()).round() as usize
    } else {
        2
    }
}

/// Shared `initialize()` body: log and report failure to the host as
/// `false`.
pub(crate) fn initialize_effect(
    name: &str,
    buffer_config: &BufferConfig,
    prepare: impl FnOnce(f32, usize) -> Result<()>,
) -> bool {
    let max_block_size = buffer_config.max_buffer_size as usize;
    match prepare(buffer_config.sample_rate, max_block_size) {
        Ok(()) => true,
        Err(err) => {
            nih_error!("{name}: failed to prepare: {err}");
            false
        }
    }
}

/// Translate a block result and tail length into the status nih-plug
/// expects. `None` for the tail means the effect may ring forever.
pub(crate) fn process_status(result: Result<()>, tail_samples: Option<u32>) -> ProcessStatus {
    if result.is_err() {
        return ProcessStatus::Error("effect processed before it was prepared");
    }

    match tail_samples {
        Some(samples) => ProcessStatus::Tail(samples),
        None => ProcessStatus::KeepAlive,
    }
}
