//! Test Utilities
//!
//! Deterministic stand-ins for timing-dependent parts of the harness.
//! Available to this crate's tests and, with the `test-util` feature, to
//! downstream tests.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::timing::Clock;

/// Deterministic clock that advances by a fixed step on every read.
///
/// Actions can call [`SteppingClock::advance`] to simulate work, which makes
/// measured durations exact.
#[derive(Debug)]
pub struct SteppingClock {
    now: AtomicU64,
    step: u64,
}

impl SteppingClock {
    /// Create a clock starting at zero that advances `step` nanos per read
    #[must_use]
    pub fn new(step: u64) -> Self {
        Self {
            now: AtomicU64::new(0),
            step,
        }
    }

    /// Move the clock forward without reading it
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for SteppingClock {
    fn now_nanos(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepping_clock() {
        let clock = SteppingClock::new(5);
        assert_eq!(clock.now_nanos(), 0);
        assert_eq!(clock.now_nanos(), 5);
        clock.advance(100);
        assert_eq!(clock.now_nanos(), 110);
    }
}
