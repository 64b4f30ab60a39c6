//! Random draws for the idle fallback.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random choices the dispatcher makes.
pub trait Randomness: Send + Sync {
    /// Uniform index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;

    /// Uniform trade code in `min..=max`.
    fn trade_code(&self, min: u32, max: u32) -> u32;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomness;

impl Randomness for ThreadRandomness {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn trade_code(&self, min: u32, max: u32) -> u32 {
        rand::thread_rng().gen_range(min..=max)
    }
}

/// A reproducible generator, for tests and replays.
#[derive(Debug)]
pub struct SeededRandomness {
    rng: Mutex<StdRng>,
}

impl SeededRandomness {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Randomness for SeededRandomness {
    fn index(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..len)
    }

    fn trade_code(&self, min: u32, max: u32) -> u32 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(min..=max)
    }
}
