//! Injectable randomness for routing fallbacks and client generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random values.
pub trait RandomSource: Send {
    /// Uniform index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize;

    /// Uniform 64-bit value.
    fn next_u64(&mut self) -> u64;
}

/// Standard generator backed by [`StdRng`].
#[derive(Debug)]
pub struct StdRandom(StdRng);

impl StdRandom {
    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn next_u64(&mut self) -> u64 {
        self.0.gen()
    }
}

/// Replays a fixed list of values in a loop.
///
/// `next_index` reduces the current value modulo `len`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<u64>,
    pos: usize,
}

impl ScriptedRandom {
    /// Create from a non-empty list of values.
    pub fn new(values: Vec<u64>) -> Self {
        assert!(!values.is_empty(), "ScriptedRandom needs at least one value");
        Self { values, pos: 0 }
    }

    fn next_value(&mut self) -> u64 {
        let v = self.values[self.pos];
        self.pos = (self.pos + 1) % self.values.len();
        v
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&mut self, len: usize) -> usize {
        (self.next_value() % len as u64) as usize
    }

    fn next_u64(&mut self) -> u64 {
        self.next_value()
    }
}
