//! # Block Processor
//!
//! The outer per-block driver shared by both effects. Each call to
//! [`Effect::process`] does the same four things:
//!
//! 1. **Poll** the parameter store's dirty flag (one atomic
//!    compare-and-swap). If it was set, derive a fresh coefficient set
//!    and hand it to the engine. Otherwise the previous set stays in
//!    force for the whole block.
//! 2. **Run** the engine's per-sample recurrence over the block, in place.
//! 3. **Settle** the engine: snap decayed filter memory to zero and flush
//!    on the first quiet block, or as soon as a non-finite input has
//!    poisoned the recursive state.
//! 4. **Sanitize** every output sample.
//!
//! Nothing in `process()` allocates, locks or logs. Buffers are sized in
//! [`Effect::prepare`], which the host never calls concurrently with
//! `process()`.

use std::sync::Arc;

use nih_plug::{nih_debug_assert, nih_log};

use crate::coefficients::Coefficients;
use crate::dsp::guard::sanitize_block;
use crate::error::{Error, Result};
use crate::params::{ParamSpec, ParameterStore};

/// The DSP half of an effect: state plus per-sample recurrence. Engines
/// know nothing about parameters, threads or hosts; the
/// [`BlockProcessor`] feeds them coefficients.
pub trait Engine {
    type Coefficients: Coefficients;

    /// The parameter table this engine's coefficients are derived from.
    const PARAMS: &'static [ParamSpec];

    /// Size every buffer for `sample_rate` and clear all state. Only ever
    /// called from `prepare()`.
    fn allocate(&mut self, sample_rate: f32) -> Result<()>;

    /// Take a new coefficient set. Called at a block boundary only.
    fn apply(&mut self, coefficients: &Self::Coefficients);

    /// Zero all delay, filter, envelope and LFO state. Coefficients are
    /// kept.
    fn reset(&mut self);

    /// Process one block in place. `block` holds one slice per channel,
    /// all the same length.
    fn process(&mut self, block: &mut [&mut [f32]]);

    /// End-of-block housekeeping: snap denormal memory to zero, and flush
    /// everything once [`has_fault`](Self::has_fault) reports poisoned
    /// state.
    fn settle(&mut self);

    /// `true` when a non-finite value has reached the recursive state
    /// (filter, envelope or feedback memory). Such state never recovers on
    /// its own.
    fn has_fault(&self) -> bool;

    /// How long the effect keeps ringing after the input stops, if that
    /// is bounded.
    fn tail_samples(&self) -> Option<u32>;
}

/// The core contract each effect exposes to its host adapter.
pub trait Effect {
    /// Size all buffers for `sample_rate` and reset state. Must not run
    /// concurrently with `process()`.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()>;

    /// Zero all delay/filter/envelope/LFO state. Idempotent.
    fn reset(&mut self);

    /// Transform `block` in place, consuming every frame.
    ///
    /// Before a successful `prepare()` the block is silenced and
    /// [`Error::NotPrepared`] is returned.
    fn process(&mut self, block: &mut [&mut [f32]]) -> Result<()>;

    /// Set a parameter by ID. The value is clamped to the declared range;
    /// the clamped value is returned.
    fn set_parameter(&self, id: &str, value: f32) -> Result<f32>;

    /// Current (clamped) value of a parameter, `None` for unknown IDs.
    fn get_parameter(&self, id: &str) -> Option<f32>;
}

/// Drives an [`Engine`] block by block from a shared [`ParameterStore`].
pub struct BlockProcessor<E: Engine> {
    params: Arc<ParameterStore>,
    engine: E,
    coefficients: E::Coefficients,
    sample_rate: f32,
    max_block_size: usize,
    prepared: bool,
}

impl<E: Engine + Default> Default for BlockProcessor<E> {
    fn default() -> Self {
        Self::new(Arc::new(ParameterStore::new(E::PARAMS)))
    }
}

impl<E: Engine + Default> BlockProcessor<E> {
    /// Build a processor reading from `params`. The store must have been
    /// created from `E::PARAMS`.
    pub fn new(params: Arc<ParameterStore>) -> Self {
        nih_debug_assert!(
            params
                .specs()
                .iter()
                .map(|spec| spec.id)
                .eq(E::PARAMS.iter().map(|spec| spec.id)),
            "parameter store was built for a different engine"
        );

        Self {
            params,
            engine: E::default(),
            coefficients: Default::default(),
            sample_rate: 0.0,
            max_block_size: 0,
            prepared: false,
        }
    }
}

impl<E: Engine> BlockProcessor<E> {
    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The coefficient set currently in force.
    pub fn coefficients(&self) -> &E::Coefficients {
        &self.coefficients
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn tail_samples(&self) -> Option<u32> {
        self.engine.tail_samples()
    }
}

impl<E: Engine> Effect for BlockProcessor<E> {
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(Error::InvalidBlockSize);
        }

        // Refuse to process until allocation has succeeded.
        self.prepared = false;
        self.engine.allocate(sample_rate)?;
        self.engine.reset();

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.prepared = true;

        // Coefficients depend on the sample rate.
        self.params.mark_dirty();

        nih_log!("Prepared at {sample_rate} Hz, up to {max_block_size} samples per block");
        Ok(())
    }

    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(&mut self, block: &mut [&mut [f32]]) -> Result<()> {
        if !self.prepared {
            for channel in block.iter_mut() {
                channel.fill(0.0);
            }
            return Err(Error::NotPrepared);
        }

        nih_debug_assert!(
            block.iter().all(|channel| channel.len() <= self.max_block_size),
            "block is longer than the prepared maximum"
        );
        nih_debug_assert!(
            block.windows(2).all(|pair| pair[0].len() == pair[1].len()),
            "channels differ in length"
        );

        if self.params.take_dirty() {
            self.coefficients =
                <E::Coefficients as Coefficients>::derive(&self.params, self.sample_rate);
            self.engine.apply(&self.coefficients);
        }

        self.engine.process(block);
        self.engine.settle();
        sanitize_block(block);

        Ok(())
    }

    fn set_parameter(&self, id: &str, value: f32) -> Result<f32> {
        self.params.set(id, value)
    }

    fn get_parameter(&self, id: &str) -> Option<f32> {
        self.params.get(id)
    }
}
