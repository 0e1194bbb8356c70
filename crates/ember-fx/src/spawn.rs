//! Spawn pacing and anti-repetition parameter sampling

use crate::rand::FxRng;

/// Draws values from a range while keeping consecutive draws visibly apart.
///
/// Up to 10 uniform attempts are made to find a draw at least `min_delta`
/// away from the previous one; if all fail, the draw is forced to the
/// midpoint of the half-range on the opposite side of the previous value —
/// a deterministic fallback, not another retry. A non-positive `min_delta`
/// disables the rule entirely.
#[derive(Debug, Clone)]
pub struct VariedSampler {
    lo: f32,
    hi: f32,
    min_delta: f32,
    prev: Option<f32>,
}

const MAX_ATTEMPTS: u32 = 10;

impl VariedSampler {
    pub fn new(lo: f32, hi: f32, min_delta: f32) -> Self {
        Self {
            lo,
            hi,
            min_delta,
            prev: None,
        }
    }

    pub fn set_range(&mut self, lo: f32, hi: f32) {
        self.lo = lo;
        self.hi = hi;
    }

    pub fn set_min_delta(&mut self, min_delta: f32) {
        self.min_delta = min_delta;
    }

    /// The deterministic value the fallback branch would produce for a given
    /// previous draw
    pub fn fallback_for(&self, prev: f32) -> f32 {
        let mid = (self.lo + self.hi) * 0.5;
        if prev >= mid {
            (self.lo + mid) * 0.5
        } else {
            (mid + self.hi) * 0.5
        }
    }

    pub fn sample(&mut self, rng: &mut FxRng) -> f32 {
        let value = self.pick(rng);
        self.prev = Some(value);
        value
    }

    fn pick(&self, rng: &mut FxRng) -> f32 {
        let Some(prev) = self.prev else {
            return rng.range(self.lo, self.hi);
        };
        if self.min_delta <= 0.0 {
            return rng.range(self.lo, self.hi);
        }
        for _ in 0..MAX_ATTEMPTS {
            let draw = rng.range(self.lo, self.hi);
            if (draw - prev).abs() >= self.min_delta {
                return draw;
            }
        }
        self.fallback_for(prev)
    }
}

/// Accumulates frame time against a spawn interval; each whole interval
/// elapsed is one spawn attempt. A long frame can owe several attempts.
#[derive(Debug, Clone)]
pub struct SpawnTimer {
    interval: f32,
    accumulator: f32,
}

impl SpawnTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            accumulator: 0.0,
        }
    }

    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval;
    }

    /// Number of spawn attempts owed after `dt` more seconds
    pub fn fire_count(&mut self, dt: f32) -> u32 {
        if self.interval <= 0.0 {
            return 0;
        }
        self.accumulator += dt;
        let mut fires = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            fires += 1;
        }
        fires
    }
}
