//! Injectable randomness for per-line visual variety
//! Location: src/simulation/jitter.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)`
pub trait JitterSource {
    fn next_unit(&mut self) -> f32;

    /// Uniform sample in `[min, max)`
    fn next_in(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_unit() * (max - min)
    }
}

/// Deterministic jitter from a seeded `StdRng`
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: StdRng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl JitterSource for SeededJitter {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Cycles through a fixed list of samples, for tests and reproducible stills
#[derive(Debug, Clone)]
pub struct FixedJitter {
    values: Vec<f32>,
    cursor: usize,
}

impl FixedJitter {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Every draw returns `value`
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl JitterSource for FixedJitter {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        // Keep the half-open contract even for hand-written fixtures
        value.clamp(0.0, 1.0 - f32::EPSILON)
    }
}
