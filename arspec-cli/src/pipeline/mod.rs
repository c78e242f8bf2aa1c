//! Monitored analysis pipeline
//!
//! One invocation runs strictly in sequence:
//!
//! ```text
//! Idle ──► WorkerRunning ──┬──► WorkerFailed            (terminal, exit 1)
//!                          │
//!                          └──► WorkerSucceeded
//!                                   │ aggregate
//!                                   ▼
//!                              MetricsAggregated
//!                                   │ render + write
//!                                   ▼
//!                              ReportsWritten           (terminal, exit 0)
//! ```
//!
//! Launch failures, worker failures and report write failures are fatal.
//! Everything between `WorkerSucceeded` and `MetricsAggregated` degrades.

mod aggregate;
mod artifacts;

pub use aggregate::{aggregate, reduce_samples, validate_residual};
pub use artifacts::{
    ArtifactError, parse_floats, parse_peaks, parse_worker_metrics, read_floats,
    read_peaks_or_empty, read_worker_metrics,
};

use crate::config::ArtifactPaths;
use arspec_monitor::{HardwareProbe, MonitorError, ProcessMonitor, WorkerCommand, platform_probe};
use arspec_report::{MetricsRecord, RenderedReports, ReportPaths, render, write_reports};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing started yet
    Idle,
    /// Worker launched and being sampled
    WorkerRunning,
    /// Worker exited non-zero or was killed
    WorkerFailed,
    /// Worker exited with code 0
    WorkerSucceeded,
    /// Unified record built
    MetricsAggregated,
    /// Text report and JSON subset on disk
    ReportsWritten,
}

impl PipelineState {
    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::WorkerFailed | PipelineState::ReportsWritten)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::WorkerRunning => "worker-running",
            PipelineState::WorkerFailed => "worker-failed",
            PipelineState::WorkerSucceeded => "worker-succeeded",
            PipelineState::MetricsAggregated => "metrics-aggregated",
            PipelineState::ReportsWritten => "reports-written",
        };
        f.write_str(name)
    }
}

/// Fatal pipeline failures
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The worker could not be launched or polled
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// The worker exited unsuccessfully
    #[error("Worker failed ({})", describe_exit(.exit_code))]
    WorkerFailed {
        /// Exit code, `None` when killed by a signal
        exit_code: Option<i32>,
        /// Captured stderr, byte for byte
        stderr: Vec<u8>,
    },

    /// The JSON subset could not be serialized
    #[error("Failed to render JSON subset: {0}")]
    Render(#[from] serde_json::Error),

    /// A report file could not be written
    #[error("Failed to write reports to {}: {source}", .path.display())]
    Write {
        /// Output directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Everything a run needs, after config and CLI flags are layered
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Analyzed recording; only its file name is used
    pub input: PathBuf,
    /// Sample rate passed to the worker, in Hz
    pub sample_rate: u32,
    /// AR model order passed to the worker
    pub ar_order: u32,
    /// Worker executable
    pub worker: PathBuf,
    /// Worker artifact locations
    pub artifacts: ArtifactPaths,
    /// Directory for persisted reports
    pub output_dir: PathBuf,
    /// Sampling tick
    pub interval: Duration,
    /// Temperature sensors, in preference order
    pub sensors: Vec<String>,
}

impl RunOptions {
    /// File name of the input, as shown in the report
    pub fn input_name(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The unified record
    pub record: MetricsRecord,
    /// All three renderings
    pub reports: RenderedReports,
    /// Where the text report and JSON subset were written
    pub paths: ReportPaths,
}

/// Tracks and logs state transitions
struct Tracker {
    state: PipelineState,
}

impl Tracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
    }
}

/// Run the pipeline with the platform's hardware probe
pub fn run_pipeline(options: &RunOptions) -> Result<RunSummary, PipelineError> {
    run_pipeline_with(options, platform_probe(options.sensors.clone()))
}

/// Run the pipeline with an explicit hardware probe
pub fn run_pipeline_with(
    options: &RunOptions,
    probe: Box<dyn HardwareProbe>,
) -> Result<RunSummary, PipelineError> {
    let started = Instant::now();
    let mut tracker = Tracker::new();

    info!(
        sample_rate = options.sample_rate,
        ar_order = options.ar_order,
        "Running analysis with monitoring"
    );
    let command = WorkerCommand::analysis(&options.worker, options.sample_rate, options.ar_order);
    let mut monitor = ProcessMonitor::new(options.interval, probe);

    tracker.advance(PipelineState::WorkerRunning);
    let outcome = monitor.run(&command)?;

    if !outcome.result.success() {
        tracker.advance(PipelineState::WorkerFailed);
        return Err(PipelineError::WorkerFailed {
            exit_code: outcome.result.exit_code,
            stderr: outcome.result.stderr,
        });
    }
    tracker.advance(PipelineState::WorkerSucceeded);
    if !outcome.result.stdout.is_empty() {
        debug!(
            stdout = %String::from_utf8_lossy(&outcome.result.stdout),
            "worker output"
        );
    }

    let record = aggregate(
        outcome.samples,
        &outcome.result,
        &options.artifacts,
        &options.input_name(),
        started,
        monitor.probe_mut(),
    );
    tracker.advance(PipelineState::MetricsAggregated);

    let reports = render(&record)?;
    let paths = ReportPaths::for_input(&options.output_dir, &options.input);
    write_reports(&reports, &paths).map_err(|source| PipelineError::Write {
        path: options.output_dir.clone(),
        source,
    })?;
    tracker.advance(PipelineState::ReportsWritten);
    info!(report = %paths.text.display(), "reports written");

    Ok(RunSummary {
        record,
        reports,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::WorkerFailed.is_terminal());
        assert!(PipelineState::ReportsWritten.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
        assert!(!PipelineState::MetricsAggregated.is_terminal());
    }

    #[test]
    fn test_tracker_advances() {
        let mut tracker = Tracker::new();
        assert_eq!(tracker.state, PipelineState::Idle);
        tracker.advance(PipelineState::WorkerRunning);
        assert_eq!(tracker.state, PipelineState::WorkerRunning);
        assert_eq!(tracker.state.to_string(), "worker-running");
    }

    #[test]
    fn test_worker_failed_message() {
        let err = PipelineError::WorkerFailed {
            exit_code: Some(2),
            stderr: Vec::new(),
        };
        assert_eq!(err.to_string(), "Worker failed (exit code 2)");
        let err = PipelineError::WorkerFailed {
            exit_code: None,
            stderr: Vec::new(),
        };
        assert_eq!(err.to_string(), "Worker failed (terminated by signal)");
    }

    #[test]
    fn test_input_name() {
        let options = RunOptions {
            input: PathBuf::from("/recordings/take_1.wav"),
            sample_rate: 44_100,
            ar_order: 8,
            worker: PathBuf::from("./bin/estimator"),
            artifacts: ArtifactPaths::default(),
            output_dir: PathBuf::from("results"),
            interval: Duration::from_millis(100),
            sensors: Vec::new(),
        };
        assert_eq!(options.input_name(), "take_1.wav");
    }
}
