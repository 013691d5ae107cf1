//! Injectable random source
//!
//! Every random decision touching a ship (hit roll, dud, variance, hit
//! location, ignition, rudder jam side) draws from one `Dice`. Production
//! code uses a seeded ChaCha stream; tests script exact rolls.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Source of uniform rolls
pub trait Dice: Send {
    /// Uniform roll in [0, 1)
    fn roll(&mut self) -> f64;

    /// Uniform index in [0, len). `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        let idx = (self.roll() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Uniform value in [lo, hi)
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.roll()
    }

    /// True with probability `chance`
    fn chance(&mut self, chance: f64) -> bool {
        self.roll() < chance
    }
}

/// Deterministic dice backed by ChaCha8
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }
}

/// Dice that replays a fixed list of rolls, then falls back to a constant
///
/// `pick` goes through `roll`, so a scripted 0.0 picks the first candidate
/// and 0.99 the last.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 0.5,
        }
    }

    /// Value returned once the script runs out
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Rolls not yet consumed
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}
