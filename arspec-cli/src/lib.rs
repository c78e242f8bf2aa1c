#![warn(missing_docs)]
//! arspec CLI Library
//!
//! Command-line driver for a monitored AR spectral analysis run. The `arspec`
//! binary launches the analysis worker, samples it until it exits, folds the
//! worker's artifacts into one metrics record and writes the reports.
//!
//! Settings come from built-in defaults, then a discovered `arspec.toml`
//! (or `--config`), then command-line flags.
//!
//! # Example
//!
//! ```text
//! arspec --sample-rate 44100 recordings/take_1.wav 16
//! arspec init > arspec.toml
//! ```

mod config;
mod pipeline;

pub use config::*;
pub use pipeline::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// arspec CLI arguments
#[derive(Parser, Debug)]
#[command(name = "arspec")]
#[command(author, version, about = "arspec - monitored AR spectral analysis")]
#[command(subcommand_negates_reqs = true, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Optional subcommand; defaults to running the analysis
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Recording to analyze (only its file name is used)
    #[arg(required = true)]
    pub input: Option<PathBuf>,

    /// AR model order passed to the worker
    #[arg(required = true)]
    pub ar_order: Option<u32>,

    /// Sample rate of the recording in Hz
    #[arg(long, required = true)]
    pub sample_rate: Option<u32>,

    /// Worker executable (overrides arspec.toml)
    #[arg(long)]
    pub worker: Option<PathBuf>,

    /// Signal samples file (overrides arspec.toml)
    #[arg(long)]
    pub signal: Option<PathBuf>,

    /// Directory for the text report and JSON subset
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Sampling interval, e.g. "100ms"
    #[arg(long)]
    pub interval: Option<String>,

    /// Configuration file (skips discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a default arspec.toml
    Init,
}

/// Run the arspec CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` once the reports are written, or the first fatal error.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the arspec CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if let Some(Commands::Init) = cli.command {
        print!("{}", ArspecConfig::default_toml());
        return Ok(());
    }

    // Initialize logging (stderr, so stdout carries only the summary)
    let filter = if cli.verbose {
        "arspec=debug"
    } else {
        "arspec=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ArspecConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ArspecConfig::discover().unwrap_or_default(),
    };
    let options = build_run_options(&cli, &config)?;

    let summary = run_pipeline(&options)?;

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}", summary.reports.console)?;
    writeln!(
        stdout,
        "\nFull report saved to: '{}'",
        summary.paths.text.display()
    )?;
    Ok(())
}

/// Layer CLI flags over the loaded configuration.
pub fn build_run_options(cli: &Cli, config: &ArspecConfig) -> anyhow::Result<RunOptions> {
    let input = cli.input.clone().context("missing <INPUT>")?;
    let ar_order = cli.ar_order.context("missing <AR_ORDER>")?;
    let sample_rate = cli.sample_rate.context("missing --sample-rate")?;

    let interval = match &cli.interval {
        Some(s) => ArspecConfig::parse_duration(s)
            .with_context(|| format!("Invalid --interval '{}'", s))?,
        None => config.interval(),
    };

    let mut artifacts = config.artifacts.clone();
    if let Some(signal) = &cli.signal {
        artifacts.signal = signal.clone();
    }

    Ok(RunOptions {
        input,
        sample_rate,
        ar_order,
        worker: cli
            .worker
            .clone()
            .unwrap_or_else(|| config.worker.executable.clone()),
        artifacts,
        output_dir: cli
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone()),
        interval,
        sensors: config.monitor.sensors.clone(),
    })
}

/// Print a fatal error to `out`.
///
/// A failed worker's stderr is passed through byte for byte.
pub fn write_error(error: &anyhow::Error, out: &mut impl Write) -> std::io::Result<()> {
    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::WorkerFailed { stderr, .. }) => {
            writeln!(out, "--- ERROR DURING WORKER EXECUTION ---")?;
            out.write_all(stderr)?;
            writeln!(out, "Error: {}", error)
        }
        _ => writeln!(out, "Error: {:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("arspec").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_run_arguments() {
        let cli = parse(&["--sample-rate", "44100", "take.wav", "16"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.input, Some(PathBuf::from("take.wav")));
        assert_eq!(cli.ar_order, Some(16));
        assert_eq!(cli.sample_rate, Some(44_100));
    }

    #[test]
    fn test_cli_init_needs_no_arguments() {
        let cli = parse(&["init"]);
        assert!(matches!(cli.command, Some(Commands::Init)));
    }

    #[test]
    fn test_cli_rejects_missing_sample_rate() {
        assert!(Cli::try_parse_from(["arspec", "take.wav", "16"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_integer_order() {
        assert!(Cli::try_parse_from(["arspec", "--sample-rate", "8000", "take.wav", "high"]).is_err());
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = parse(&[
            "--sample-rate",
            "8000",
            "--worker",
            "/opt/estimator",
            "--signal",
            "/tmp/signal.txt",
            "--output-dir",
            "out",
            "--interval",
            "20ms",
            "take.wav",
            "4",
        ]);
        let options = build_run_options(&cli, &ArspecConfig::default()).unwrap();

        assert_eq!(options.worker, PathBuf::from("/opt/estimator"));
        assert_eq!(options.artifacts.signal, PathBuf::from("/tmp/signal.txt"));
        assert_eq!(
            options.artifacts.peaks,
            PathBuf::from("data/peaks_output.txt")
        );
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert_eq!(options.interval, Duration::from_millis(20));
        assert_eq!(options.sample_rate, 8000);
        assert_eq!(options.ar_order, 4);
    }

    #[test]
    fn test_config_used_without_flags() {
        let cli = parse(&["--sample-rate", "8000", "take.wav", "4"]);
        let mut config = ArspecConfig::default();
        config.monitor.interval = "250ms".to_string();
        config.output.directory = PathBuf::from("reports");

        let options = build_run_options(&cli, &config).unwrap();
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.output_dir, PathBuf::from("reports"));
        assert_eq!(options.worker, PathBuf::from("./bin/estimator"));
    }

    #[test]
    fn test_bad_interval_flag_is_an_error() {
        let cli = parse(&["--sample-rate", "8000", "--interval", "often", "take.wav", "4"]);
        assert!(build_run_options(&cli, &ArspecConfig::default()).is_err());
    }

    #[test]
    fn test_write_error_passes_worker_stderr_through() {
        let stderr = b"estimator: cannot open \xff input\n".to_vec();
        let error = anyhow::Error::new(PipelineError::WorkerFailed {
            exit_code: Some(2),
            stderr: stderr.clone(),
        });
        let mut out = Vec::new();
        write_error(&error, &mut out).unwrap();

        assert!(out.starts_with(b"--- ERROR DURING WORKER EXECUTION ---\n"));
        assert!(out.windows(stderr.len()).any(|w| w == stderr.as_slice()));
        assert!(out.ends_with(b"Error: Worker failed (exit code 2)\n"));
    }

    #[test]
    fn test_write_error_generic() {
        let error = anyhow::anyhow!("config broken");
        let mut out = Vec::new();
        write_error(&error, &mut out).unwrap();
        assert_eq!(out, b"Error: config broken\n");
    }
}
