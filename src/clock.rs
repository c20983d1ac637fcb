//! Frame clock used by the render loop.

use instant::{Duration, Instant};

/// Tracks the time since the loop started and since the previous tick.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    last: Instant,
    elapsed: Duration,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance the clock and return the time passed since the previous tick.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    pub(crate) fn tick_at(&mut self, now: Instant) -> Duration {
        let dt = now.duration_since(self.last);
        self.last = now;
        self.elapsed = now.duration_since(self.start);
        dt
    }

    /// Elapsed time as of the last tick.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_delta_and_accumulates_elapsed() {
        let mut clock = Clock::new();
        let start = clock.start;
        let dt = clock.tick_at(start + Duration::from_millis(16));
        assert_eq!(dt, Duration::from_millis(16));
        let dt = clock.tick_at(start + Duration::from_millis(40));
        assert_eq!(dt, Duration::from_millis(24));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn elapsed_is_zero_before_first_tick() {
        assert_eq!(Clock::new().elapsed(), Duration::ZERO);
    }
}
