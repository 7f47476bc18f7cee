//! Subjects Under Measurement
//!
//! A [`Subject`] is a named closure together with its warmup and iteration
//! counts. Subjects are built through a staged builder so that every field
//! is supplied, in order, before a subject exists:
//!
//! ```
//! use microbench_core::SubjectSpec;
//!
//! let subject = SubjectSpec
//!     .named("vec-push")?
//!     .warmup_cycles(1_000)
//!     .iterations(10_000)
//!     .action(|| {
//!         let mut v = Vec::new();
//!         v.push(1);
//!         std::hint::black_box(v);
//!     })
//!     .into_subject();
//!
//! assert_eq!(subject.name(), "vec-push");
//! # Ok::<(), microbench_core::BenchError>(())
//! ```

use std::fmt;

use crate::error::BenchError;

/// Boxed action or cleanup closure
pub type BoxedAction = Box<dyn FnMut() -> anyhow::Result<()>>;

fn infallible(mut f: impl FnMut() + 'static) -> BoxedAction {
    Box::new(move || {
        f();
        Ok(())
    })
}

// ============================================================================
// Subject
// ============================================================================

/// A named closure with its warmup and iteration counts
pub struct Subject {
    name: String,
    warmup_cycles: u64,
    iterations: u64,
    action: BoxedAction,
    cleanup: BoxedAction,
}

impl Subject {
    /// Subject name, unique within a bench
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Untimed executions before measurement
    #[must_use]
    pub fn warmup_cycles(&self) -> u64 {
        self.warmup_cycles
    }

    /// Timed executions
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Run the action once
    pub fn run_action(&mut self) -> anyhow::Result<()> {
        (self.action)()
    }

    /// Run the cleanup once
    pub fn run_cleanup(&mut self) -> anyhow::Result<()> {
        (self.cleanup)()
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("name", &self.name)
            .field("warmup_cycles", &self.warmup_cycles)
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Staged Builder
// ============================================================================

/// Starting point of the subject builder
#[derive(Clone, Copy, Debug, Default)]
pub struct SubjectSpec;

impl SubjectSpec {
    /// Name the subject
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::EmptyName`] if `name` is empty.
    pub fn named(self, name: impl Into<String>) -> Result<NamedSubject, BenchError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BenchError::EmptyName);
        }
        Ok(NamedSubject { name })
    }
}

/// Builder stage: name set, warmup count pending
#[derive(Clone, Debug)]
pub struct NamedSubject {
    name: String,
}

impl NamedSubject {
    /// Set the number of untimed warmup cycles
    #[must_use]
    pub fn warmup_cycles(self, warmup_cycles: u64) -> WarmedSubject {
        WarmedSubject {
            name: self.name,
            warmup_cycles,
        }
    }
}

/// Builder stage: warmup count set, iteration count pending
#[derive(Clone, Debug)]
pub struct WarmedSubject {
    name: String,
    warmup_cycles: u64,
}

impl WarmedSubject {
    /// Set the number of timed iterations
    #[must_use]
    pub fn iterations(self, iterations: u64) -> CountedSubject {
        CountedSubject {
            name: self.name,
            warmup_cycles: self.warmup_cycles,
            iterations,
        }
    }
}

/// Builder stage: counts set, action pending
#[derive(Clone, Debug)]
pub struct CountedSubject {
    name: String,
    warmup_cycles: u64,
    iterations: u64,
}

impl CountedSubject {
    /// Set an action that cannot fail
    #[must_use]
    pub fn action(self, action: impl FnMut() + 'static) -> SubjectEnd {
        self.fallible_action_boxed(infallible(action))
    }

    /// Set an action whose error aborts the run
    #[must_use]
    pub fn fallible_action(
        self,
        action: impl FnMut() -> anyhow::Result<()> + 'static,
    ) -> SubjectEnd {
        self.fallible_action_boxed(Box::new(action))
    }

    fn fallible_action_boxed(self, action: BoxedAction) -> SubjectEnd {
        SubjectEnd {
            subject: Subject {
                name: self.name,
                warmup_cycles: self.warmup_cycles,
                iterations: self.iterations,
                action,
                cleanup: Box::new(|| Ok(())),
            },
        }
    }
}

/// Final builder stage: complete subject, cleanup optional
#[derive(Debug)]
pub struct SubjectEnd {
    subject: Subject,
}

impl SubjectEnd {
    /// Run `cleanup` after every action, outside the timed region
    #[must_use]
    pub fn cleanup(self, cleanup: impl FnMut() + 'static) -> Self {
        self.with_cleanup(infallible(cleanup))
    }

    /// Like [`SubjectEnd::cleanup`], for cleanups that can fail
    #[must_use]
    pub fn fallible_cleanup(self, cleanup: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.with_cleanup(Box::new(cleanup))
    }

    fn with_cleanup(mut self, cleanup: BoxedAction) -> Self {
        self.subject.cleanup = cleanup;
        self
    }

    /// Finish building
    #[must_use]
    pub fn into_subject(self) -> Subject {
        self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_empty_name_rejected() {
        let err = SubjectSpec.named("").unwrap_err();
        assert!(matches!(err, BenchError::EmptyName));
    }

    #[test]
    fn test_builder_sets_fields() {
        let subject = SubjectSpec
            .named(String::from("s"))
            .unwrap()
            .warmup_cycles(3)
            .iterations(7)
            .action(|| {})
            .into_subject();

        assert_eq!(subject.name(), "s");
        assert_eq!(subject.warmup_cycles(), 3);
        assert_eq!(subject.iterations(), 7);
    }

    #[test]
    fn test_default_cleanup_is_noop() {
        let mut subject = SubjectSpec
            .named("s")
            .unwrap()
            .warmup_cycles(0)
            .iterations(0)
            .action(|| {})
            .into_subject();
        assert!(subject.run_cleanup().is_ok());
    }

    #[test]
    fn test_action_and_cleanup_invoked() {
        let calls = Rc::new(Cell::new(0));
        let cleanups = Rc::new(Cell::new(0));
        let (c, k) = (Rc::clone(&calls), Rc::clone(&cleanups));

        let mut subject = SubjectSpec
            .named("s")
            .unwrap()
            .warmup_cycles(0)
            .iterations(1)
            .action(move || c.set(c.get() + 1))
            .cleanup(move || k.set(k.get() + 1))
            .into_subject();

        subject.run_action().unwrap();
        subject.run_action().unwrap();
        subject.run_cleanup().unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn test_fallible_action_error_surfaces() {
        let mut subject = SubjectSpec
            .named("s")
            .unwrap()
            .warmup_cycles(0)
            .iterations(1)
            .fallible_action(|| anyhow::bail!("nope"))
            .into_subject();
        assert_eq!(subject.run_action().unwrap_err().to_string(), "nope");
    }

    #[test]
    fn test_debug_omits_closures() {
        let subject = SubjectSpec
            .named("dbg")
            .unwrap()
            .warmup_cycles(1)
            .iterations(2)
            .action(|| {})
            .into_subject();
        let rendered = format!("{subject:?}");
        assert!(rendered.contains("dbg"));
        assert!(rendered.contains(".."));
    }
}
