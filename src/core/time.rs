//! World clock used to stamp octree updates

use std::time::{Duration, Instant};

/// Monotonic clock measuring seconds since the world was created.
///
/// `advance` shifts the reading forward without waiting, which lets
/// simulations and tests step time deterministically.
#[derive(Clone, Debug)]
pub struct WorldClock {
    origin: Instant,
    skew: Duration,
}

impl WorldClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            skew: Duration::ZERO,
        }
    }

    /// Seconds since creation
    pub fn now(&self) -> f64 {
        (self.origin.elapsed() + self.skew).as_secs_f64()
    }

    /// Move the clock forward by `secs`
    pub fn advance(&mut self, secs: f64) {
        if secs > 0.0 {
            self.skew += Duration::from_secs_f64(secs);
        }
    }
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let clock = WorldClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_advance() {
        let mut clock = WorldClock::new();
        let before = clock.now();
        clock.advance(10.0);
        assert!(clock.now() - before >= 10.0);

        // negative steps are ignored
        let t = clock.now();
        clock.advance(-5.0);
        assert!(clock.now() >= t);
    }
}
