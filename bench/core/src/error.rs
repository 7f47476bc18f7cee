//! Harness Errors
//!
//! Errors raised while building subjects or running a bench.

use std::fmt;

use thiserror::Error;

/// Boxed error returned by a failing action or cleanup
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Phase of a run in which an action or cleanup failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Untimed warmup cycles
    Warmup,
    /// Timed measurement iterations
    Measure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warmup => write!(f, "warmup"),
            Self::Measure => write!(f, "measure"),
        }
    }
}

/// Errors that can occur while building or running a bench
#[derive(Debug, Error)]
pub enum BenchError {
    /// Subject name was empty
    #[error("subject name must not be empty")]
    EmptyName,

    /// A subject with the same name is already registered
    #[error("subject already exists: {0}")]
    DuplicateSubject(String),

    /// An action or cleanup returned an error, aborting the run
    #[error("subject '{subject}' failed during {phase}: {source}")]
    ActionFailed {
        /// Name of the failing subject
        subject: String,
        /// Phase in which the failure happened
        phase: Phase,
        /// The error returned by the closure
        #[source]
        source: ActionError,
    },
}

impl BenchError {
    pub(crate) fn action_failed(subject: &str, phase: Phase, source: anyhow::Error) -> Self {
        Self::ActionFailed {
            subject: subject.to_string(),
            phase,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_failed_message() {
        let err = BenchError::action_failed("vec", Phase::Measure, anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "subject 'vec' failed during measure: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_duplicate_message() {
        let err = BenchError::DuplicateSubject("a".into());
        assert_eq!(err.to_string(), "subject already exists: a");
    }
}
