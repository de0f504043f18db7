//! Synthetic sensor for bench runs without chips attached.
//!
//! Unlike the hardware sensors this one does not cache: `read()` draws a
//! new value from `[lower, upper]` every call, and `poll()` does nothing.
//! It is always available.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::Sensor;
use crate::config::SimBounds;

pub struct RandomSensor {
    name: &'static str,
    lower: f32,
    upper: f32,
    rng: SmallRng,
}

impl RandomSensor {
    /// Inverted bounds are swapped; non-finite bounds collapse to 0.0.
    pub fn new(name: &'static str, bounds: SimBounds, seed: u64) -> Self {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        let (a, b) = (finite(bounds.lower), finite(bounds.upper));
        Self {
            name,
            lower: a.min(b),
            upper: a.max(b),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn bounds(&self) -> SimBounds {
        SimBounds::new(self.lower, self.upper)
    }
}

impl Sensor for RandomSensor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn setup(&mut self) {}

    fn poll(&mut self) {}

    fn is_available(&self) -> bool {
        true
    }

    fn read(&mut self) -> f32 {
        self.rng.gen_range(self.lower..=self.upper)
    }
}
