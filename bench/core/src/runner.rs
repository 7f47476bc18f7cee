//! Bench Runner
//!
//! Drives a run: one clock calibration, warmup of every subject, then timed
//! iterations subject by subject.
//!
//! ```text
//! calibrate ──► warmup(s1) … warmup(sN) ──► measure(s1) … measure(sN)
//!                (action, cleanup)×w          (t0, action, t1, cleanup)×i
//! ```
//!
//! Only the action sits between the two clock reads. Cleanup runs after the
//! second read so its cost never reaches the samples.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{BenchError, Phase};
use crate::histogram::Histogram;
use crate::result::{round_2dp, BenchReport, BenchResult};
use crate::subject::Subject;
use crate::timing::{calibrate, Calibration, Clock, MonotonicClock, DEFAULT_CALIBRATION_ITERATIONS};

// ============================================================================
// Configuration
// ============================================================================

/// Settings shared by every subject of a run
#[derive(Clone)]
pub struct RunnerConfig {
    /// Clock reads used to estimate clock overhead (0 disables calibration)
    pub calibration_iterations: u64,
    /// Clock used for calibration and measurement
    pub clock: Arc<dyn Clock>,
}

impl RunnerConfig {
    /// Set calibration iterations
    #[must_use]
    pub fn with_calibration_iterations(mut self, iterations: u64) -> Self {
        self.calibration_iterations = iterations;
        self
    }

    /// Use a different clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            calibration_iterations: DEFAULT_CALIBRATION_ITERATIONS,
            clock: Arc::new(MonotonicClock::new()),
        }
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("calibration_iterations", &self.calibration_iterations)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Executes warmup and measurement for a set of subjects
#[derive(Clone, Debug, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runner configuration
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Estimate clock overhead for this run
    #[must_use]
    pub fn calibrate(&self) -> Calibration {
        calibrate(self.config.clock.as_ref(), self.config.calibration_iterations)
    }

    /// Run a subject's warmup cycles
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] on the first failing action or
    /// cleanup.
    pub fn warm_up(&self, subject: &mut Subject) -> Result<(), BenchError> {
        debug!(
            subject = subject.name(),
            cycles = subject.warmup_cycles(),
            "Warming up"
        );
        for _ in 0..subject.warmup_cycles() {
            run_step(subject, Phase::Warmup, Subject::run_action)?;
            run_step(subject, Phase::Warmup, Subject::run_cleanup)?;
        }
        Ok(())
    }

    /// Time a subject's iterations
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] on the first failing action or
    /// cleanup.
    pub fn measure(
        &self,
        subject: &mut Subject,
        calibration: &Calibration,
    ) -> Result<BenchResult, BenchError> {
        let clock = self.config.clock.as_ref();
        let iterations = subject.iterations();
        info!(subject = subject.name(), iterations, "Measuring subject");

        let mut histogram = Histogram::nanos_default();
        for _ in 0..iterations {
            let before = clock.now_nanos();
            let outcome = subject.run_action();
            let after = clock.now_nanos();
            outcome.map_err(|e| BenchError::action_failed(subject.name(), Phase::Measure, e))?;

            histogram.record(after.saturating_sub(before));
            run_step(subject, Phase::Measure, Subject::run_cleanup)?;
        }

        let snapshot = histogram.snapshot();
        let average_nanos = if snapshot.total == 0 {
            0.0
        } else {
            round_2dp((snapshot.mean - calibration.per_call_nanos).max(0.0))
        };

        let result = BenchResult {
            average_nanos,
            min_nanos: snapshot.min,
            max_nanos: snapshot.max,
            iterations: snapshot.total,
            p50_nanos: snapshot.p50(),
            p90_nanos: snapshot.p90(),
            p99_nanos: snapshot.p99(),
        };

        info!(
            subject = subject.name(),
            average_nanos = result.average_nanos,
            min_nanos = result.min_nanos,
            max_nanos = result.max_nanos,
            "Subject measured"
        );
        Ok(result)
    }

    /// Calibrate, warm up every subject, then measure each in order
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] on the first failing action or
    /// cleanup; no report is produced.
    pub fn run(&self, subjects: &mut [Subject]) -> Result<BenchReport, BenchError> {
        let calibration = self.calibrate();
        let mut report = BenchReport::new(Utc::now(), calibration);
        info!(
            subjects = subjects.len(),
            clock_overhead_nanos = calibration.per_call_nanos,
            "Starting bench run"
        );

        for subject in subjects.iter_mut() {
            self.warm_up(subject)?;
        }
        for subject in subjects.iter_mut() {
            let result = self.measure(subject, &calibration)?;
            report.push(subject.name(), result);
        }

        Ok(report)
    }
}

fn run_step(
    subject: &mut Subject,
    phase: Phase,
    step: fn(&mut Subject) -> anyhow::Result<()>,
) -> Result<(), BenchError> {
    step(subject).map_err(|e| BenchError::action_failed(subject.name(), phase, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::SubjectSpec;
    use crate::test_utils::SteppingClock;
    use pretty_assertions::assert_eq;

    fn stepping_runner(step: u64) -> (Runner, Arc<SteppingClock>) {
        let clock = Arc::new(SteppingClock::new(step));
        let config = RunnerConfig::default()
            .with_calibration_iterations(100)
            .with_clock(clock.clone());
        (Runner::new(config), clock)
    }

    #[test]
    fn test_measure_subtracts_clock_overhead() {
        let (runner, clock) = stepping_runner(3);
        let work = Arc::clone(&clock);
        let mut subject = SubjectSpec
            .named("work")
            .unwrap()
            .warmup_cycles(0)
            .iterations(50)
            .action(move || work.advance(40))
            .into_subject();

        let calibration = runner.calibrate();
        assert!((calibration.per_call_nanos - 3.0).abs() < f64::EPSILON);

        let result = runner.measure(&mut subject, &calibration).unwrap();
        assert_eq!(result.iterations, 50);
        assert_eq!(result.min_nanos, 43);
        assert_eq!(result.max_nanos, 43);
        assert!((result.average_nanos - 40.0).abs() < f64::EPSILON);
        assert_eq!(result.p50_nanos, 50);
    }

    #[test]
    fn test_cleanup_is_not_timed() {
        let (runner, clock) = stepping_runner(1);
        let cleanup_clock = Arc::clone(&clock);
        let mut subject = SubjectSpec
            .named("cheap")
            .unwrap()
            .warmup_cycles(0)
            .iterations(10)
            .action(|| {})
            .cleanup(move || cleanup_clock.advance(1_000_000))
            .into_subject();

        let result = runner.measure(&mut subject, &Calibration::default()).unwrap();
        assert_eq!(result.max_nanos, 1);
    }

    #[test]
    fn test_average_rounds_exact_midpoint_up() {
        let (runner, clock) = stepping_runner(1);
        let work = Arc::clone(&clock);
        let mut first = true;
        // One 2ns sample among 199 of 1ns: mean is exactly 1.005
        let mut subject = SubjectSpec
            .named("midpoint")
            .unwrap()
            .warmup_cycles(0)
            .iterations(200)
            .action(move || {
                if std::mem::take(&mut first) {
                    work.advance(1);
                }
            })
            .into_subject();

        let result = runner.measure(&mut subject, &Calibration::default()).unwrap();
        assert_eq!(result.average_nanos, 1.01);
        assert_eq!(result.to_string(), "Result{average=1.01, min=1, max=2}");
    }

    #[test]
    fn test_zero_iterations() {
        let (runner, _clock) = stepping_runner(1);
        let mut subject = SubjectSpec
            .named("nothing")
            .unwrap()
            .warmup_cycles(0)
            .iterations(0)
            .action(|| {})
            .into_subject();

        let result = runner.measure(&mut subject, &runner.calibrate()).unwrap();
        assert_eq!(result, BenchResult::default());
    }

    #[test]
    fn test_average_clamped_at_zero() {
        let (runner, _clock) = stepping_runner(1);
        let mut subject = SubjectSpec
            .named("free")
            .unwrap()
            .warmup_cycles(0)
            .iterations(5)
            .action(|| {})
            .into_subject();

        let result = runner
            .measure(&mut subject, &Calibration { per_call_nanos: 10.0 })
            .unwrap();
        assert!(result.average_nanos.abs() < f64::EPSILON);
    }

    #[test]
    fn test_measure_failure_reports_phase() {
        let (runner, _clock) = stepping_runner(1);
        let mut subject = SubjectSpec
            .named("broken")
            .unwrap()
            .warmup_cycles(0)
            .iterations(3)
            .fallible_action(|| Err(anyhow::anyhow!("kaboom")))
            .into_subject();

        let err = runner
            .measure(&mut subject, &Calibration::default())
            .unwrap_err();
        match err {
            BenchError::ActionFailed { subject, phase, .. } => {
                assert_eq!(subject, "broken");
                assert_eq!(phase, Phase::Measure);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_warmup_cleanup_failure_reports_phase() {
        let (runner, _clock) = stepping_runner(1);
        let mut subject = SubjectSpec
            .named("leaky")
            .unwrap()
            .warmup_cycles(2)
            .iterations(0)
            .action(|| {})
            .fallible_cleanup(|| anyhow::bail!("cleanup failed"))
            .into_subject();

        let err = runner.warm_up(&mut subject).unwrap_err();
        assert!(matches!(
            err,
            BenchError::ActionFailed {
                phase: Phase::Warmup,
                ..
            }
        ));
    }
}
