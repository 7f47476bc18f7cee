//! Microbench Core - In-Process Micro-Benchmark Harness
//!
//! Times small closures inside the current process. A bench holds one or
//! more named subjects; running it calibrates the cost of reading the clock,
//! warms every subject up, then times each subject's iterations and reports
//! the average (with clock overhead removed), minimum and maximum duration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   add_subject    ┌────────────────────┐
//! │    Bench     │ ───────────────► │ Single/MultiSubject│
//! └──────────────┘                  └─────────┬──────────┘
//!                                             │ run
//!                                   ┌─────────▼──────────┐
//!                                   │       Runner       │
//!                                   │ calibrate / warmup │
//!                                   │     / measure      │
//!                                   └─────────┬──────────┘
//!                                             │
//!                       ┌─────────────────────┼───────────────────┐
//!                       ▼                     ▼                   ▼
//!                 ┌──────────┐         ┌────────────┐      ┌─────────────┐
//!                 │  Clock   │         │ Histogram  │      │ BenchReport │
//!                 └──────────┘         └────────────┘      └─────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use microbench_core::bench;
//!
//! fn main() -> Result<(), microbench_core::BenchError> {
//!     bench()
//!         .add_subject(|spec| {
//!             Ok(spec
//!                 .named("vec-push")?
//!                 .warmup_cycles(100_000)
//!                 .iterations(1_000_000)
//!                 .action(|| {
//!                     let mut v = Vec::new();
//!                     v.push(1);
//!                     std::hint::black_box(v);
//!                 }))
//!         })?
//!         .add_subject(|spec| {
//!             Ok(spec
//!                 .named("box")?
//!                 .warmup_cycles(100_000)
//!                 .iterations(1_000_000)
//!                 .action(|| {
//!                     std::hint::black_box(Box::new(7u64));
//!                 }))
//!         })?
//!         .run_and_print()
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`bench`]: Entry point and subject collections
//! - [`subject`]: Subjects and their staged builder
//! - [`runner`]: Calibration, warmup and measurement
//! - [`timing`]: Clock abstraction and overhead calibration
//! - [`histogram`]: Iteration duration distribution
//! - [`result`]: Per-subject results and run reports
//! - [`config`]: TOML / environment / CLI configuration
//! - [`error`]: Harness errors
//! - `test_utils`: Deterministic clock (`test-util` feature)

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod bench;
pub mod config;
pub mod error;
pub mod histogram;
pub mod result;
pub mod runner;
pub mod subject;
pub mod timing;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

// Re-exports for convenience
pub use bench::{bench, Bench, MultiSubjectBench, SingleSubjectBench};
pub use error::{BenchError, Phase};
pub use histogram::{Histogram, HistogramSnapshot};
pub use result::{BenchReport, BenchResult, NamedResult};
pub use runner::{Runner, RunnerConfig};
pub use subject::{Subject, SubjectEnd, SubjectSpec};
pub use timing::{calibrate, Calibration, Clock, MonotonicClock};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, BenchConfigFile,
    BenchToml, ConfigError, ConfigOverrides, ConfigSource, OutputFormat,
};
