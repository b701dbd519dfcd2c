//! Time sources for the frame loop. All times are seconds as `f64`.

use std::cell::Cell;

use instant::Instant;

pub trait Clock {
    fn now(&self) -> f64;
}

/// Seconds since construction, from the platform monotonic clock.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to; used for fixed-step hosts and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn starting_at(now: f64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn advance(&self, dt_sec: f64) -> f64 {
        let now = self.now.get() + dt_sec;
        self.now.set(now);
        now
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
