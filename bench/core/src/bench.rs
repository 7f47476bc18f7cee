//! Bench Entry Point
//!
//! A bench grows one subject at a time:
//!
//! ```text
//! Bench ──add_subject──► SingleSubjectBench ──add_subject──► MultiSubjectBench
//!                             │ run() → BenchResult              │ run() → BenchReport
//! ```
//!
//! A single-subject bench hands back the bare result; once a second subject
//! joins, results come back as an ordered [`BenchReport`].

use crate::error::BenchError;
use crate::result::{BenchReport, BenchResult};
use crate::runner::{Runner, RunnerConfig};
use crate::subject::{Subject, SubjectEnd, SubjectSpec};

fn build_subject<F>(build: F) -> Result<Subject, BenchError>
where
    F: FnOnce(SubjectSpec) -> Result<SubjectEnd, BenchError>,
{
    build(SubjectSpec).map(SubjectEnd::into_subject)
}

/// Start a new bench with default settings
#[must_use]
pub fn bench() -> Bench {
    Bench::new()
}

// ============================================================================
// Bench
// ============================================================================

/// An empty bench
#[derive(Clone, Debug, Default)]
pub struct Bench {
    config: RunnerConfig,
}

impl Bench {
    /// Create an empty bench
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the runner configuration
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add the first subject
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `build`.
    pub fn add_subject<F>(self, build: F) -> Result<SingleSubjectBench, BenchError>
    where
        F: FnOnce(SubjectSpec) -> Result<SubjectEnd, BenchError>,
    {
        Ok(SingleSubjectBench {
            subject: build_subject(build)?,
            config: self.config,
        })
    }
}

// ============================================================================
// Single Subject
// ============================================================================

/// A bench holding exactly one subject
#[derive(Debug)]
pub struct SingleSubjectBench {
    subject: Subject,
    config: RunnerConfig,
}

impl SingleSubjectBench {
    /// Replace the runner configuration
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// The registered subject
    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Add a second subject
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `build`, and returns
    /// [`BenchError::DuplicateSubject`] if the new name is already taken.
    pub fn add_subject<F>(self, build: F) -> Result<MultiSubjectBench, BenchError>
    where
        F: FnOnce(SubjectSpec) -> Result<SubjectEnd, BenchError>,
    {
        MultiSubjectBench {
            subjects: vec![self.subject],
            config: self.config,
        }
        .add_subject(build)
    }

    /// Calibrate, warm up and measure the subject
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] if the action or cleanup fails.
    pub fn run(&mut self) -> Result<BenchResult, BenchError> {
        let runner = Runner::new(self.config.clone());
        let calibration = runner.calibrate();
        runner.warm_up(&mut self.subject)?;
        runner.measure(&mut self.subject, &calibration)
    }

    /// Run and print `name: Result{...}` to stdout
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] if the action or cleanup fails.
    pub fn run_and_print(&mut self) -> Result<(), BenchError> {
        let result = self.run()?;
        println!("{}: {}", self.subject.name(), result);
        Ok(())
    }
}

// ============================================================================
// Many Subjects
// ============================================================================

/// A bench holding any number of uniquely named subjects
#[derive(Debug, Default)]
pub struct MultiSubjectBench {
    subjects: Vec<Subject>,
    config: RunnerConfig,
}

impl MultiSubjectBench {
    /// Create a bench with no subjects
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the runner configuration
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registered subjects, in order
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Add another subject
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `build`, and returns
    /// [`BenchError::DuplicateSubject`] if the new name is already taken.
    pub fn add_subject<F>(mut self, build: F) -> Result<Self, BenchError>
    where
        F: FnOnce(SubjectSpec) -> Result<SubjectEnd, BenchError>,
    {
        let subject = build_subject(build)?;
        if self.subjects.iter().any(|s| s.name() == subject.name()) {
            return Err(BenchError::DuplicateSubject(subject.name().to_string()));
        }
        self.subjects.push(subject);
        Ok(self)
    }

    /// Calibrate, warm up every subject, then measure each in order
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] on the first failing action or
    /// cleanup.
    pub fn run(&mut self) -> Result<BenchReport, BenchError> {
        Runner::new(self.config.clone()).run(&mut self.subjects)
    }

    /// Run and print one `name: Result{...}` line per subject to stdout
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ActionFailed`] on the first failing action or
    /// cleanup.
    pub fn run_and_print(&mut self) -> Result<(), BenchError> {
        let report = self.run()?;
        print!("{report}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_subject_with_same_name_rejected() {
        let err = bench()
            .add_subject(|s| Ok(s.named("a")?.warmup_cycles(0).iterations(1).action(|| {})))
            .unwrap()
            .add_subject(|s| Ok(s.named("a")?.warmup_cycles(0).iterations(1).action(|| {})))
            .unwrap_err();
        assert!(matches!(err, BenchError::DuplicateSubject(name) if name == "a"));
    }

    #[test]
    fn test_builder_error_propagates() {
        let err = bench()
            .add_subject(|s| Ok(s.named("")?.warmup_cycles(0).iterations(1).action(|| {})))
            .unwrap_err();
        assert!(matches!(err, BenchError::EmptyName));
    }

    #[test]
    fn test_multi_keeps_registration_order() {
        let bench = MultiSubjectBench::new()
            .add_subject(|s| Ok(s.named("z")?.warmup_cycles(0).iterations(0).action(|| {})))
            .unwrap()
            .add_subject(|s| Ok(s.named("a")?.warmup_cycles(0).iterations(0).action(|| {})))
            .unwrap();
        let names: Vec<_> = bench.subjects().iter().map(Subject::name).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_empty_multi_runs_to_empty_report() {
        let report = MultiSubjectBench::new()
            .with_config(RunnerConfig::default().with_calibration_iterations(0))
            .run()
            .unwrap();
        assert!(report.is_empty());
    }
}
