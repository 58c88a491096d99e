//! Stateful value distributions driving measurement fields.

use rand::Rng;

/// A value source that advances one step at a time.
///
/// `advance` mutates state; `get` reads the current value without mutation.
pub trait Distribution: Send + Sync {
    fn advance(&mut self, rng: &mut dyn rand::RngCore);
    fn get(&self) -> f64;
}

/// Random walk with uniform steps in `[-step, step]`, clamped to `[min, max]`.
#[derive(Debug, Clone)]
pub struct ClampedRandomWalk {
    step: f64,
    min: f64,
    max: f64,
    state: f64,
}

impl ClampedRandomWalk {
    pub fn new(step: f64, min: f64, max: f64, initial: f64) -> Self {
        Self {
            step,
            min,
            max,
            state: initial.clamp(min, max),
        }
    }

    /// Start at a random point within the range.
    pub fn starting_anywhere<R: Rng + ?Sized>(rng: &mut R, step: f64, min: f64, max: f64) -> Self {
        let initial = rng.gen_range(min..=max);
        Self::new(step, min, max, initial)
    }
}

impl Distribution for ClampedRandomWalk {
    fn advance(&mut self, rng: &mut dyn rand::RngCore) {
        let delta = rng.gen_range(-self.step..=self.step);
        self.state = (self.state + delta).clamp(self.min, self.max);
    }

    fn get(&self) -> f64 {
        self.state
    }
}

/// Independent uniform draw in `[min, max]` at every step.
#[derive(Debug, Clone)]
pub struct Uniform {
    min: f64,
    max: f64,
    state: f64,
}

impl Uniform {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            state: min,
        }
    }
}

impl Distribution for Uniform {
    fn advance(&mut self, rng: &mut dyn rand::RngCore) {
        self.state = rng.gen_range(self.min..=self.max);
    }

    fn get(&self) -> f64 {
        self.state
    }
}
