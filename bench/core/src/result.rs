//! Bench Results
//!
//! Per-subject timing results and the ordered report of a whole run.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::timing::Calibration;

/// Round half-up to two decimal places.
///
/// Rounds the shortest decimal rendering of `value`, so a mean of exactly
/// `1.005` (stored as `1.00499…`) becomes `1.01`.
pub(crate) fn round_2dp(value: f64) -> f64 {
    BigDecimal::from_str(&value.to_string())
        .ok()
        .and_then(|d| {
            d.with_scale_round(2, RoundingMode::HalfUp)
                .to_string()
                .parse()
                .ok()
        })
        .unwrap_or(value)
}

// ============================================================================
// Per-Subject Result
// ============================================================================

/// Timing result for one subject. All durations are nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BenchResult {
    /// Mean action duration with clock overhead removed, two decimals
    pub average_nanos: f64,
    /// Fastest single iteration
    pub min_nanos: u64,
    /// Slowest single iteration
    pub max_nanos: u64,
    /// Number of timed iterations
    pub iterations: u64,
    /// Median bucket bound
    pub p50_nanos: u64,
    /// 90th percentile bucket bound
    pub p90_nanos: u64,
    /// 99th percentile bucket bound
    pub p99_nanos: u64,
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Result{{average={:.2}, min={}, max={}}}",
            self.average_nanos, self.min_nanos, self.max_nanos
        )
    }
}

// ============================================================================
// Report
// ============================================================================

/// A subject's name paired with its result
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedResult {
    /// Subject name
    pub name: String,
    /// Timing result
    #[serde(flatten)]
    pub result: BenchResult,
}

/// Results of a run, in subject registration order
#[derive(Clone, Debug, Serialize)]
pub struct BenchReport {
    started_at: DateTime<Utc>,
    calibration: Calibration,
    results: Vec<NamedResult>,
}

impl BenchReport {
    pub(crate) fn new(started_at: DateTime<Utc>, calibration: Calibration) -> Self {
        Self {
            started_at,
            calibration,
            results: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &str, result: BenchResult) {
        self.results.push(NamedResult {
            name: name.to_string(),
            result,
        });
    }

    /// When the run started
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Clock overhead subtracted from every average
    #[must_use]
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Result for a subject, by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BenchResult> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.result)
    }

    /// Results in registration order
    pub fn iter(&self) -> impl Iterator<Item = &NamedResult> {
        self.results.iter()
    }

    /// Subject names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.name.as_str())
    }

    /// Number of subjects measured
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no subject was measured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.results {
            writeln!(f, "{}: {}", entry.name, entry.result)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BenchReport {
    type Item = &'a NamedResult;
    type IntoIter = std::slice::Iter<'a, NamedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
