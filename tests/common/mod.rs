//! Helpers shared by the integration tests.

#![allow(dead_code)]

use loveless_fx::coefficients::Coefficients;
use loveless_fx::{Effect, Engine, ParameterStore};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Deterministic noise in `[-1, 1]`.
pub fn noise(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect()
}

/// A unit impulse at sample 0 followed by silence.
pub fn impulse(len: usize) -> Vec<f32> {
    let mut signal = vec![0.0; len];
    if let Some(first) = signal.first_mut() {
        *first = 1.0;
    }
    signal
}

/// Run a stereo signal through `effect` in blocks of `block_size`,
/// returning the processed channels.
pub fn run_stereo(
    effect: &mut impl Effect,
    left: &[f32],
    right: &[f32],
    block_size: usize,
) -> (Vec<f32>, Vec<f32>) {
    let mut left = left.to_vec();
    let mut right = right.to_vec();

    for (l, r) in left
        .chunks_mut(block_size)
        .zip(right.chunks_mut(block_size))
    {
        effect.process(&mut [l, r]).unwrap();
    }
    (left, right)
}

/// Run a mono signal through `effect` in blocks of `block_size`.
pub fn run_mono(effect: &mut impl Effect, input: &[f32], block_size: usize) -> Vec<f32> {
    let mut output = input.to_vec();
    for block in output.chunks_mut(block_size) {
        effect.process(&mut [block]).unwrap();
    }
    output
}

pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

pub fn energy(signal: &[f32]) -> f32 {
    signal.iter().map(|s| s * s).sum()
}

/// Index of the loudest sample in `signal[range]`, relative to the whole
/// signal.
pub fn argmax_in(signal: &[f32], range: std::ops::Range<usize>) -> usize {
    let start = range.start;
    signal[range]
        .iter()
        .enumerate()
        .fold((0, 0.0_f32), |(best, peak), (i, s)| {
            if s.abs() > peak {
                (i, s.abs())
            } else {
                (best, peak)
            }
        })
        .0
        + start
}

/// Drives an engine block by block the way the block processor does, but
/// without the output sanitizer, so tests see exactly what the DSP made.
pub struct RawEngine<E: Engine> {
    pub store: ParameterStore,
    pub engine: E,
    sample_rate: f32,
}

impl<E: Engine + Default> RawEngine<E> {
    pub fn new(sample_rate: f32) -> Self {
        let mut engine = E::default();
        engine.allocate(sample_rate).unwrap();
        engine.reset();
        Self {
            store: ParameterStore::new(E::PARAMS),
            engine,
            sample_rate,
        }
    }
}

impl<E: Engine> RawEngine<E> {
    pub fn set(&self, id: &str, value: f32) {
        self.store.set(id, value).unwrap();
    }

    /// Process one block. Returns whether the engine state was still
    /// finite before the end-of-block settle.
    pub fn process(&mut self, block: &mut [&mut [f32]]) -> bool {
        if self.store.take_dirty() {
            let coefficients =
                <E::Coefficients as Coefficients>::derive(&self.store, self.sample_rate);
            self.engine.apply(&coefficients);
        }
        self.engine.process(block);
        let finite = !self.engine.has_fault();
        self.engine.settle();
        finite
    }

    pub fn run_stereo(
        &mut self,
        left: &[f32],
        right: &[f32],
        block_size: usize,
    ) -> (Vec<f32>, Vec<f32>) {
        let mut left = left.to_vec();
        let mut right = right.to_vec();

        for (l, r) in left
            .chunks_mut(block_size)
            .zip(right.chunks_mut(block_size))
        {
            assert!(self.process(&mut [l, r]), "engine state went non-finite");
        }
        (left, right)
    }
}
