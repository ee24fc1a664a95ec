//! Fixed-step simulation clock.
//!
//! All deadlines in the simulation (ability phases, cooldowns, status effect
//! expiry) are absolute values of [`SimClock::elapsed`].

use bevy::prelude::*;

use super::components::SimulationSpeed;
use super::constants::DEFAULT_TICK_RATE_HZ;

/// Monotonic tick clock advanced once per simulation update.
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    /// Seconds of simulated time since the clock started
    pub elapsed: f32,
    /// Seconds advanced by the most recent tick (0 while paused)
    pub delta: f32,
    /// Number of ticks advanced so far
    pub tick: u64,
    step: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE_HZ)
    }
}

impl SimClock {
    /// Create a clock that advances `1 / tick_rate_hz` seconds per tick.
    pub fn new(tick_rate_hz: f32) -> Self {
        let rate = if tick_rate_hz > 0.0 { tick_rate_hz } else { DEFAULT_TICK_RATE_HZ };
        Self {
            elapsed: 0.0,
            delta: 0.0,
            tick: 0,
            step: 1.0 / rate,
        }
    }

    /// Seconds per tick at normal speed.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Advance one tick scaled by `multiplier`. A zero multiplier pauses time.
    pub fn advance(&mut self, multiplier: f32) {
        self.delta = self.step * multiplier.max(0.0);
        if self.delta > 0.0 {
            self.elapsed += self.delta;
            self.tick += 1;
        }
    }
}

/// Advance the clock at the start of every simulation update.
pub fn advance_clock(mut clock: ResMut<SimClock>, speed: Res<SimulationSpeed>) {
    clock.advance(speed.multiplier);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_fixed_steps() {
        let mut clock = SimClock::new(50.0);
        clock.advance(1.0);
        clock.advance(1.0);
        assert_eq!(clock.tick, 2);
        assert!((clock.elapsed - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_paused_clock_does_not_tick() {
        let mut clock = SimClock::new(60.0);
        clock.advance(0.0);
        assert_eq!(clock.tick, 0);
        assert_eq!(clock.delta, 0.0);
    }
}
