//! Microbench - Built-in Workload Runner
//!
//! Runs the built-in workloads through the microbench harness and prints
//! one result line per workload (or a JSON report).
//!
//! # Usage
//!
//! ```bash
//! # Run every workload with the configured defaults
//! microbench
//!
//! # Compare two workloads with smaller counts
//! microbench -w error-roundtrip -w vec-push --warmup 10000 --iterations 100000
//!
//! # JSON output with a config file
//! microbench --config ./microbench.toml --format json
//!
//! # Verbose logging (to stderr)
//! RUST_LOG=debug microbench
//! ```
//!
//! # Environment Variables
//!
//! - `MICROBENCH_CONFIG`: Configuration file path
//! - `MICROBENCH_WARMUP_CYCLES`, `MICROBENCH_ITERATIONS`,
//!   `MICROBENCH_CALIBRATION_ITERATIONS`, `MICROBENCH_FORMAT`
//! - `RUST_LOG`: Log filter (overrides `--log-level`)

mod workloads;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use microbench_core::{
    default_config_path, load_config_from_path, BenchConfigFile, BenchReport, ConfigOverrides,
    MultiSubjectBench, OutputFormat,
};

/// Microbench - time small built-in workloads in-process
#[derive(Parser, Debug)]
#[command(name = "microbench")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "MICROBENCH_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Workload to run (repeatable; default: all)
    #[arg(short = 'w', long = "workload", value_name = "NAME")]
    workloads: Vec<String>,

    /// Untimed cycles per workload
    #[arg(long, value_name = "N")]
    warmup: Option<u64>,

    /// Timed iterations per workload
    #[arg(long, value_name = "N")]
    iterations: Option<u64>,

    /// Clock reads used to estimate clock overhead
    #[arg(long, value_name = "N")]
    calibration_iterations: Option<u64>,

    /// Report format (text, json)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// List built-in workloads and exit
    #[arg(long)]
    list: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            warmup_cycles: self.warmup,
            iterations: self.iterations,
            calibration_iterations: self.calibration_iterations,
            format: self.format,
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("microbench={level}").parse()?)
            .add_directive(format!("microbench_core={level}").parse()?),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
    Ok(())
}

fn load(args: &Args) -> Result<BenchConfigFile> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);

    info!(
        source = %config.source(),
        warmup_cycles = config.warmup_cycles,
        iterations = config.iterations,
        calibration_iterations = config.calibration_iterations,
        "Configuration resolved"
    );
    Ok(config)
}

fn run(config: &BenchConfigFile, selected: &[workloads::Workload]) -> Result<BenchReport> {
    let mut bench = MultiSubjectBench::new().with_config(config.runner_config());
    for workload in selected {
        bench = bench.add_subject(|spec| {
            Ok(spec
                .named(workload.name)?
                .warmup_cycles(config.warmup_cycles)
                .iterations(config.iterations)
                .action(workload.action))
        })?;
    }
    Ok(bench.run()?)
}

fn print_report(report: &BenchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list {
        for workload in workloads::all() {
            println!("{:<16} {}", workload.name, workload.description);
        }
        return Ok(());
    }

    let config = load(&args)?;
    let selected = workloads::select(&args.workloads)?;
    info!(workloads = selected.len(), "Running bench");

    let report = run(&config, &selected).context("Bench run failed")?;
    print_report(&report, config.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "microbench",
            "-w",
            "vec-push",
            "--workload",
            "box-alloc",
            "--iterations",
            "10",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.workloads, vec!["vec-push", "box-alloc"]);
        assert_eq!(args.iterations, Some(10));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.warmup, None);
        assert!(!args.list);
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!(Args::try_parse_from(["microbench", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_overrides_from_args() {
        let args =
            Args::try_parse_from(["microbench", "--warmup", "5", "--calibration-iterations", "0"])
                .unwrap();
        let mut config = BenchConfigFile::default();
        args.overrides().apply(&mut config);
        assert_eq!(config.warmup_cycles, 5);
        assert_eq!(config.calibration_iterations, 0);
        assert_eq!(config.iterations, BenchConfigFile::default().iterations);
    }

    #[test]
    fn test_run_small_counts() {
        let mut config = BenchConfigFile::default();
        ConfigOverrides::new()
            .with_warmup_cycles(10)
            .with_iterations(100)
            .with_calibration_iterations(1_000)
            .apply(&mut config);

        let selected = workloads::select(&["vec-push".into(), "error-roundtrip".into()]).unwrap();
        let report = run(&config, &selected).unwrap();
        assert_eq!(
            report.names().collect::<Vec<_>>(),
            vec!["vec-push", "error-roundtrip"]
        );
        assert!(report.iter().all(|r| r.result.iterations == 100));
    }
}
