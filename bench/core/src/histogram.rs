//! Latency Histogram
//!
//! Fixed-bucket distribution of per-iteration durations in nanoseconds.
//! Measurement is single-threaded, so counts are plain integers.

// ============================================================================
// Histogram
// ============================================================================

/// A histogram for tracking iteration duration distributions
#[derive(Clone, Debug)]
pub struct Histogram {
    /// Bucket upper bounds (inclusive), ascending
    buckets: Vec<u64>,
    /// Count per bucket
    counts: Vec<u64>,
    /// Total count
    total_count: u64,
    /// Sum of all values
    sum: u128,
    /// Minimum value seen
    min: u64,
    /// Maximum value seen
    max: u64,
}

impl Histogram {
    /// Create a new histogram with the given bucket upper bounds.
    ///
    /// An empty bound list gets a single catch-all bucket.
    #[must_use]
    pub fn new(mut buckets: Vec<u64>) -> Self {
        if buckets.is_empty() {
            buckets.push(u64::MAX);
        }
        let counts = vec![0; buckets.len()];
        Self {
            buckets,
            counts,
            total_count: 0,
            sum: 0,
            min: u64::MAX,
            max: 0,
        }
    }

    /// Create with default nanosecond buckets (25ns to 1s)
    #[must_use]
    pub fn nanos_default() -> Self {
        Self::new(vec![
            25,
            50,
            100,
            250,
            500,
            1_000,
            2_500,
            5_000,
            10_000,
            25_000,
            50_000,
            100_000,
            250_000,
            1_000_000,
            10_000_000,
            100_000_000,
            1_000_000_000,
        ])
    }

    /// Record a value. Values above the last bound land in the last bucket.
    pub fn record(&mut self, value: u64) {
        let bucket_idx = self
            .buckets
            .iter()
            .position(|&b| value <= b)
            .unwrap_or(self.buckets.len() - 1);

        self.counts[bucket_idx] += 1;
        self.total_count += 1;
        self.sum += u128::from(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Get histogram snapshot
    #[must_use]
    pub fn snapshot(&self) -> HistogramSnapshot {
        let total = self.total_count;
        HistogramSnapshot {
            buckets: self.buckets.clone(),
            counts: self.counts.clone(),
            total,
            sum: self.sum,
            min: if total == 0 { 0 } else { self.min },
            max: self.max,
            mean: if total > 0 {
                self.sum as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::nanos_default()
    }
}

/// Snapshot of histogram data
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramSnapshot {
    /// Bucket upper bounds
    pub buckets: Vec<u64>,
    /// Count per bucket
    pub counts: Vec<u64>,
    /// Number of recorded values
    pub total: u64,
    /// Sum of recorded values
    pub sum: u128,
    /// Smallest recorded value, 0 when empty
    pub min: u64,
    /// Largest recorded value, 0 when empty
    pub max: u64,
    /// Arithmetic mean, 0.0 when empty
    pub mean: f64,
}

impl HistogramSnapshot {
    /// Upper bound of the bucket containing the `p` quantile (0.0 - 1.0)
    #[must_use]
    pub fn percentile(&self, p: f64) -> u64 {
        if self.total == 0 {
            return 0;
        }

        let target = ((self.total as f64 * p).ceil() as u64).clamp(1, self.total);
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return self.buckets[i];
            }
        }

        self.buckets.last().copied().unwrap_or(0)
    }

    /// Get p50
    #[must_use]
    pub fn p50(&self) -> u64 {
        self.percentile(0.5)
    }

    /// Get p90
    #[must_use]
    pub fn p90(&self) -> u64 {
        self.percentile(0.9)
    }

    /// Get p99
    #[must_use]
    pub fn p99(&self) -> u64 {
        self.percentile(0.99)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram() {
        let mut hist = Histogram::new(vec![10, 25, 50, 100]);

        hist.record(5); // Goes into bucket 10
        hist.record(15); // Goes into bucket 25
        hist.record(75); // Goes into bucket 100
        hist.record(200); // Goes into bucket 100 (last bucket)

        let snap = hist.snapshot();
        assert_eq!(snap.total, 4);
        assert_eq!(snap.counts, vec![1, 1, 0, 2]);
        assert_eq!(snap.min, 5);
        assert_eq!(snap.max, 200);
        assert_eq!(snap.sum, 295);
    }

    #[test]
    fn test_percentiles() {
        let mut hist = Histogram::new(vec![10, 50, 100, 500, 1000]);

        for i in 0..100 {
            hist.record(i * 10);
        }

        let snap = hist.snapshot();
        assert_eq!(snap.p50(), 500);
        assert_eq!(snap.p90(), 1000);
        assert_eq!(snap.percentile(0.01), 10);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = Histogram::nanos_default().snapshot();
        assert_eq!(snap.total, 0);
        assert_eq!(snap.min, 0);
        assert_eq!(snap.max, 0);
        assert_eq!(snap.p99(), 0);
        assert!(snap.mean.abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_bounds_get_catch_all_bucket() {
        let mut hist = Histogram::new(Vec::new());
        hist.record(42);
        assert_eq!(hist.snapshot().p50(), u64::MAX);
    }
}
