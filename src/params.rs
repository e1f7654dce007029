//! # Parameter Store
//!
//! Parameters are the knobs the user sees. Each one has:
//!
//! - A **unique string ID** that hosts and presets use to find it. Once
//!   published, never change these IDs or saved sessions will break.
//! - A **human-readable name** and a **unit label** for display.
//! - A **range** and a **default value**.
//!
//! ## Threading
//!
//! The control thread (UI, host automation) writes values; the audio
//! thread reads them. Every value lives in its own atomic cell, so there
//! are no locks anywhere. A single process-wide `dirty` flag tells the
//! audio thread that *something* changed. The audio thread clears it with
//! one compare-and-swap at the start of a block and only then re-derives
//! its coefficients, so a block never sees half of a parameter change.
//!
//! ```text
//! control thread                       audio thread (once per block)
//! ──────────────                       ─────────────────────────────
//! set("mix", 40.0)
//!   ├─ clamp to range                  take_dirty()? ──no──► keep coefficients
//!   ├─ store bits (Relaxed)                 │
//!   └─ dirty = true (Release) ───────►     yes
//!                                           └─► Coefficients::derive(store)
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use nih_plug::nih_warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a parameter's plain value maps onto the normalized `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamRange {
    /// Evenly spaced between `min` and `max`.
    Linear { min: f32, max: f32 },

    /// Equal normalized steps multiply the value by a constant ratio:
    ///
    /// ```text
    /// plain = min * (max / min)^t
    /// ```
    ///
    /// Used where perception is logarithmic (LFO rate). Both bounds must
    /// be strictly positive.
    Exponential { min: f32, max: f32 },

    /// A discrete choice. The plain value is the index into `labels`.
    Choice { labels: &'static [&'static str] },
}

impl ParamRange {
    pub fn min(&self) -> f32 {
        match *self {
            ParamRange::Linear { min, .. } | ParamRange::Exponential { min, .. } => min,
            ParamRange::Choice { .. } => 0.0,
        }
    }

    pub fn max(&self) -> f32 {
        match *self {
            ParamRange::Linear { max, .. } | ParamRange::Exponential { max, .. } => max,
            ParamRange::Choice { labels } => labels.len().saturating_sub(1) as f32,
        }
    }

    /// Clamp a plain value into the range. Choices also snap to the
    /// nearest index.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = match self {
            ParamRange::Choice { .. } => value.round(),
            _ => value,
        };
        value.clamp(self.min(), self.max())
    }

    /// Map a plain value to `[0, 1]`.
    pub fn normalize(&self, plain: f32) -> f32 {
        let plain = self.clamp(plain);
        let (min, max) = (self.min(), self.max());
        if max <= min {
            return 0.0;
        }
        match self {
            ParamRange::Linear { .. } | ParamRange::Choice { .. } => (plain - min) / (max - min),
            ParamRange::Exponential { .. } => (plain / min).ln() / (max / min).ln(),
        }
    }

    /// Map a normalized `[0, 1]` value back to a plain value.
    pub fn unnormalize(&self, normalized: f32) -> f32 {
        let t = normalized.clamp(0.0, 1.0);
        let (min, max) = (self.min(), self.max());
        let plain = match self {
            ParamRange::Linear { .. } | ParamRange::Choice { .. } => min + t * (max - min),
            ParamRange::Exponential { .. } => min * (max / min).powf(t),
        };
        self.clamp(plain)
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Stable identifier used by `set`/`get`, snapshots and hosts.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    pub range: ParamRange,
    /// Default plain value.
    pub default: f32,
    /// Unit label shown after the value (e.g. `"dB"`).
    pub unit: &'static str,
    /// Display step size. `0.0` means continuous.
    pub step: f32,
}

impl ParamSpec {
    /// Clamp a plain value into range. `NaN` falls back to the default.
    pub fn sanitize(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            self.range.clamp(value)
        }
    }
}

/// The current value of every parameter of one engine, shared between the
/// control thread and the audio thread.
///
/// Wrap it in an `Arc`: the host adapter owns it, the
/// [`BlockProcessor`](crate::processor::BlockProcessor) keeps a reference.
#[derive(Debug)]
pub struct ParameterStore {
    specs: &'static [ParamSpec],

    /// Plain values stored as `f32` bit patterns.
    values: Box<[AtomicU32]>,

    /// Set by every write, consumed once per block by the audio thread.
    dirty: AtomicBool,
}

impl ParameterStore {
    /// Create a store holding every parameter at its default. The store
    /// starts dirty so the first processed block derives coefficients.
    pub fn new(specs: &'static [ParamSpec]) -> Self {
        let values = specs
            .iter()
            .map(|spec| AtomicU32::new(spec.default.to_bits()))
            .collect();

        Self {
            specs,
            values,
            dirty: AtomicBool::new(true),
        }
    }

    /// The parameter table this store was built from.
    pub fn specs(&self) -> &'static [ParamSpec] {
        self.specs
    }

    /// Position of `id` in the table. Linear scan; control thread only.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.id == id)
    }

    /// The clamped current value of `id`, or `None` for unknown names.
    pub fn get(&self, id: &str) -> Option<f32> {
        self.index_of(id).map(|index| self.value(index))
    }

    /// Set `id` to `value` clamped into its declared range and mark the
    /// store dirty. Returns the value that was actually stored.
    ///
    /// This never does any DSP work. The new value takes effect at the
    /// next block boundary.
    pub fn set(&self, id: &str, value: f32) -> Result<f32> {
        let index = self
            .index_of(id)
            .ok_or_else(|| Error::UnknownParameter(id.to_owned()))?;
        Ok(self.set_value(index, value))
    }

    /// The current value of `id` mapped into `[0, 1]` through its range.
    pub fn get_normalized(&self, id: &str) -> Option<f32> {
        let index = self.index_of(id)?;
        Some(self.specs[index].range.normalize(self.value(index)))
    }

    /// Set `id` from a `[0, 1]` value. Returns the stored plain value.
    pub fn set_normalized(&self, id: &str, normalized: f32) -> Result<f32> {
        let index = self
            .index_of(id)
            .ok_or_else(|| Error::UnknownParameter(id.to_owned()))?;
        let plain = self.specs[index].range.unnormalize(normalized);
        Ok(self.set_value(index, plain))
    }

    /// Lock-free read by table index. This is what the audio thread uses.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the parameter table.
    #[inline]
    pub fn value(&self, index: usize) -> f32 {
        f32::from_bits(self.values[index].load(Ordering::Relaxed))
    }

    /// Lock-free write by table index. Returns the clamped value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the parameter table.
    pub fn set_value(&self, index: usize, value: f32) -> f32 {
        let value = self.specs[index].sanitize(value);
        self.values[index].store(value.to_bits(), Ordering::Relaxed);
        // Release orders the value store before the flag, so the audio
        // thread's Acquire in `take_dirty` sees the new value.
        self.dirty.store(true, Ordering::Release);
        value
    }

    /// Force the next block to re-derive coefficients (e.g. after a sample
    /// rate change).
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Atomically test and clear the dirty flag. Returns `true` when at
    /// least one parameter was written since the last call.
    #[inline]
    pub fn take_dirty(&self) -> bool {
        self.dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Copy every value, in table order.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: self
                .specs
                .iter()
                .enumerate()
                .map(|(index, spec)| (spec.id.to_owned(), self.value(index)))
                .collect(),
        }
    }

    /// Apply a snapshot. Known IDs are clamped into range, unknown IDs are
    /// skipped. Returns how many values were applied.
    pub fn restore(&self, snapshot: &ParamSnapshot) -> usize {
        let mut applied = 0;
        for (id, value) in &snapshot.values {
            match self.index_of(id) {
                Some(index) => {
                    self.set_value(index, *value);
                    applied += 1;
                }
                None => nih_warn!("Ignoring unknown parameter '{id}' in snapshot"),
            }
        }
        self.mark_dirty();
        applied
    }
}

/// Persisted state: an ordered list of `(id, plain value)` pairs.
///
/// The on-disk format is the host wrapper's business; this is only the
/// data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSnapshot {
    pub values: Vec<(String, f32)>,
}

impl ParamSnapshot {
    pub fn get(&self, id: &str) -> Option<f32> {
        self.values
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, value)| *value)
    }
}
