//! Demo clock with fixed-timestep accumulator

use std::time::Instant;

/// Tracks elapsed time and hands out fixed simulation steps.
///
/// Interactive callers feed it real time via `tick()`; headless callers
/// (the CLI driver, tests) feed synthetic time via `advance()`. Either way
/// the simulation consumes whole fixed steps, so results are identical for
/// the same total time.
pub struct DemoClock {
    /// Total elapsed time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Fixed timestep interval (default: 1/60 second)
    pub fixed_timestep: f64,
    accumulator: f64,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for DemoClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            fixed_timestep: 1.0 / 60.0,
            accumulator: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl DemoClock {
    /// Create a new clock with the default 60 Hz timestep
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock with a custom fixed timestep
    pub fn with_fixed_timestep(hz: f64) -> Self {
        Self {
            fixed_timestep: 1.0 / hz,
            ..Self::default()
        }
    }

    /// Advance from wall-clock time. Call once per rendered frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.accumulate(elapsed);
    }

    /// Advance by a synthetic amount of time (headless drive)
    pub fn advance(&mut self, seconds: f64) {
        self.first_tick = false;
        self.accumulate(seconds);
    }

    fn accumulate(&mut self, elapsed: f64) {
        // Clamp long frames so a stall can't queue a burst of catch-up steps
        self.delta_time = elapsed.min(0.25);
        self.total_time += self.delta_time;
        self.accumulator += self.delta_time;
    }

    /// True while the accumulator holds at least one fixed step
    pub fn should_fixed_update(&self) -> bool {
        self.accumulator >= self.fixed_timestep
    }

    /// Consume one fixed timestep from the accumulator
    pub fn consume_fixed_step(&mut self) {
        self.accumulator -= self.fixed_timestep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let clock = DemoClock::new();
        assert!((clock.fixed_timestep - 1.0 / 60.0).abs() < 1e-10);
        assert_eq!(clock.total_time, 0.0);
    }

    #[test]
    fn custom_timestep() {
        let clock = DemoClock::with_fixed_timestep(30.0);
        assert!((clock.fixed_timestep - 1.0 / 30.0).abs() < 1e-10);
    }

    #[test]
    fn first_tick_has_zero_delta() {
        let mut clock = DemoClock::new();
        clock.tick();
        assert_eq!(clock.delta_time, 0.0);
    }

    #[test]
    fn synthetic_advance_fills_accumulator() {
        let mut clock = DemoClock::new();
        clock.advance(1.0 / 30.0); // two fixed steps worth

        assert!(clock.should_fixed_update());
        clock.consume_fixed_step();
        assert!(clock.should_fixed_update());
        clock.consume_fixed_step();
        assert!(!clock.should_fixed_update());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut clock = DemoClock::new();
        clock.advance(10.0);
        assert!((clock.delta_time - 0.25).abs() < 1e-10);
        assert!((clock.total_time - 0.25).abs() < 1e-10);
    }
}
