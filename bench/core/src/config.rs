//! TOML Configuration File Support
//!
//! Centralized configuration loading for bench runs, supporting a TOML
//! configuration file at `~/.config/microbench/microbench.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [defaults]
//! warmup_cycles = 100000
//! iterations = 1000000
//!
//! [calibration]
//! iterations = 1000000
//!
//! [output]
//! format = "json"
//! ```
//!
//! # Environment Variables
//!
//! - `MICROBENCH_WARMUP_CYCLES`
//! - `MICROBENCH_ITERATIONS`
//! - `MICROBENCH_CALIBRATION_ITERATIONS`
//! - `MICROBENCH_FORMAT` (`text` or `json`)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runner::RunnerConfig;
use crate::timing::DEFAULT_CALIBRATION_ITERATIONS;

/// Default untimed cycles per subject
pub const DEFAULT_WARMUP_CYCLES: u64 = 100_000;

/// Default timed iterations per subject
pub const DEFAULT_ITERATIONS: u64 = 1_000_000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Output Format
// =============================================================================

/// How a report is rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `name: Result{...}` line per subject
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::ValidationError(format!(
                "unknown output format '{other}' (expected text or json)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Per-subject defaults section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsToml {
    /// Untimed cycles per subject
    pub warmup_cycles: Option<i64>,

    /// Timed iterations per subject
    pub iterations: Option<i64>,
}

/// Calibration section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationToml {
    /// Clock reads used to estimate clock overhead
    pub iterations: Option<i64>,
}

/// Output section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputToml {
    /// Report format, `text` or `json`
    pub format: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchToml {
    /// Per-subject defaults
    pub defaults: DefaultsToml,

    /// Calibration settings
    pub calibration: CalibrationToml,

    /// Output settings
    pub output: OutputToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for a bench run
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfigFile {
    /// Untimed cycles per subject
    pub warmup_cycles: u64,

    /// Timed iterations per subject
    pub iterations: u64,

    /// Clock reads used to estimate clock overhead
    pub calibration_iterations: u64,

    /// Report format
    pub format: OutputFormat,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for BenchConfigFile {
    fn default() -> Self {
        Self {
            warmup_cycles: DEFAULT_WARMUP_CYCLES,
            iterations: DEFAULT_ITERATIONS,
            calibration_iterations: DEFAULT_CALIBRATION_ITERATIONS,
            format: OutputFormat::Text,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl BenchConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that set a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Runner settings derived from this configuration
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default().with_calibration_iterations(self.calibration_iterations)
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/microbench/microbench.toml` or
/// `~/.config/microbench/microbench.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("microbench").join("microbench.toml"))
}

/// Load configuration from the default path and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or a
/// value fails validation. A missing config file is not an error.
pub fn load_config() -> Result<BenchConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or a value fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<BenchConfigFile, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<BenchConfigFile, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BenchConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_config = read_toml(config_path)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env)?;

    Ok(config)
}

fn read_toml(path: &Path) -> Result<BenchToml, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&content)?)
}

fn non_negative(field: &str, value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value)
        .map_err(|_| ConfigError::ValidationError(format!("{field} cannot be negative: {value}")))
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut BenchConfigFile, toml: &BenchToml) -> Result<(), ConfigError> {
    if let Some(cycles) = toml.defaults.warmup_cycles {
        config.warmup_cycles = non_negative("defaults.warmup_cycles", cycles)?;
    }
    if let Some(iterations) = toml.defaults.iterations {
        config.iterations = non_negative("defaults.iterations", iterations)?;
    }
    if let Some(iterations) = toml.calibration.iterations {
        config.calibration_iterations = non_negative("calibration.iterations", iterations)?;
    }
    if let Some(format) = &toml.output.format {
        config.format = format.parse()?;
    }
    Ok(())
}

fn parse_count(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::ValidationError(format!("{key}='{raw}': {e}")))
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut BenchConfigFile, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = env("MICROBENCH_WARMUP_CYCLES") {
        config.warmup_cycles = parse_count("MICROBENCH_WARMUP_CYCLES", &raw)?;
        config.source = ConfigSource::Env;
    }
    if let Some(raw) = env("MICROBENCH_ITERATIONS") {
        config.iterations = parse_count("MICROBENCH_ITERATIONS", &raw)?;
        config.source = ConfigSource::Env;
    }
    if let Some(raw) = env("MICROBENCH_CALIBRATION_ITERATIONS") {
        config.calibration_iterations = parse_count("MICROBENCH_CALIBRATION_ITERATIONS", &raw)?;
        config.source = ConfigSource::Env;
    }
    if let Some(raw) = env("MICROBENCH_FORMAT") {
        config.format = raw.parse()?;
        config.source = ConfigSource::Env;
    }
    Ok(())
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Warmup cycles override
    pub warmup_cycles: Option<u64>,

    /// Iterations override
    pub iterations: Option<u64>,

    /// Calibration iterations override
    pub calibration_iterations: Option<u64>,

    /// Output format override
    pub format: Option<OutputFormat>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set warmup cycles override
    #[must_use]
    pub fn with_warmup_cycles(mut self, cycles: u64) -> Self {
        self.warmup_cycles = Some(cycles);
        self
    }

    /// Set iterations override
    #[must_use]
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Set calibration iterations override
    #[must_use]
    pub fn with_calibration_iterations(mut self, iterations: u64) -> Self {
        self.calibration_iterations = Some(iterations);
        self
    }

    /// Set output format override
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut BenchConfigFile) {
        if self.warmup_cycles.is_some()
            || self.iterations.is_some()
            || self.calibration_iterations.is_some()
            || self.format.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(cycles) = self.warmup_cycles {
            config.warmup_cycles = cycles;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(iterations) = self.calibration_iterations {
            config.calibration_iterations = iterations;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
