//! Clocks and Timer Calibration
//!
//! Every measured iteration reads the clock twice, so the cost of a clock
//! read is estimated once per run and subtracted from subject averages.

use std::fmt;
use std::hint::black_box;
use std::time::Instant;

use serde::Serialize;

/// Number of clock reads used for calibration unless configured otherwise
pub const DEFAULT_CALIBRATION_ITERATIONS: u64 = 1_000_000;

// ============================================================================
// Clock
// ============================================================================

/// A monotonic nanosecond clock
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin. Never decreases.
    fn now_nanos(&self) -> u64;
}

/// Wall-independent clock backed by [`Instant`]
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the current instant
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        // u64 nanoseconds cover ~584 years of process uptime
        self.origin.elapsed().as_nanos() as u64
    }
}

// ============================================================================
// Calibration
// ============================================================================

/// Estimated cost of a single clock read
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Calibration {
    /// Nanoseconds attributed to one clock read
    pub per_call_nanos: f64,
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}ns per clock read", self.per_call_nanos)
    }
}

/// Estimate clock-read overhead.
///
/// Times `iterations` clock reads, then an empty loop of the same length,
/// and attributes the difference to the reads. Negative estimates (noise on
/// very fast clocks) are clamped to zero.
pub fn calibrate(clock: &dyn Clock, iterations: u64) -> Calibration {
    if iterations == 0 {
        return Calibration::default();
    }

    let start = clock.now_nanos();
    for _ in 0..iterations {
        black_box(clock.now_nanos());
    }
    let with_reads = clock.now_nanos().saturating_sub(start);

    let start = clock.now_nanos();
    for i in 0..iterations {
        black_box(i);
    }
    let empty_loop = clock.now_nanos().saturating_sub(start);

    let per_call_nanos = (with_reads as f64 - empty_loop as f64) / iterations as f64;
    let calibration = Calibration {
        per_call_nanos: per_call_nanos.max(0.0),
    };

    tracing::debug!(
        iterations,
        with_reads_nanos = with_reads,
        empty_loop_nanos = empty_loop,
        per_call_nanos = calibration.per_call_nanos,
        "Calibrated clock overhead"
    );

    calibration
}
