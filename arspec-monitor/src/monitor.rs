//! Process Monitor
//!
//! Runs the worker as a child process and samples it until it exits.
//!
//! ## Sampling
//!
//! ```text
//! spawn ──► prime CPU counters
//!             │
//!             ▼
//!       ┌──────────────┐  alive?  ┌──────────────────────────────┐
//!       │ try_wait()   │─────────►│ sleep(interval), refresh,    │
//!       └──────────────┘          │ read cpu/ram + probe, push   │
//!             ▲                   └──────────────┬───────────────┘
//!             └──────────────────────────────────┘
//!             │ exited / vanished
//!             ▼
//!        wait(), join stdout/stderr readers
//! ```
//!
//! The tick is the CPU measurement window: the worker's CPU time is compared
//! across one interval, so cadence and measurement share the same clock.

use crate::probe::HardwareProbe;
use crate::sample::{BYTES_PER_MB, MonitorOutcome, ResourceSample, WorkerResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use thiserror::Error;
use tracing::{debug, info};

/// Default tick interval (~10 Hz)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Failures that end a monitored run before the worker's exit status is known
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The worker executable could not be started
    #[error("Failed to launch worker {}: {source}", .path.display())]
    Spawn {
        /// Executable that was requested
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Polling or reaping the worker failed
    #[error("Failed to poll worker: {0}")]
    Wait(#[source] std::io::Error),
}

/// Executable and arguments for the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    /// Path to the worker executable
    pub executable: PathBuf,
    /// Positional arguments
    pub args: Vec<String>,
}

impl WorkerCommand {
    /// Command with no arguments
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// The analysis worker's calling convention: `<sample_rate> <ar_order>`
    pub fn analysis(executable: impl Into<PathBuf>, sample_rate: u32, ar_order: u32) -> Self {
        Self::new(executable).arg(sample_rate).arg(ar_order)
    }

    fn path(&self) -> &Path {
        &self.executable
    }
}

/// Launches a worker and records one [`ResourceSample`] per tick
pub struct ProcessMonitor {
    system: System,
    probe: Box<dyn HardwareProbe>,
    interval: Duration,
}

impl ProcessMonitor {
    /// Create a monitor with the given tick interval and hardware probe
    pub fn new(interval: Duration, probe: Box<dyn HardwareProbe>) -> Self {
        Self {
            system: System::new(),
            probe,
            interval,
        }
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The hardware probe, for readings taken outside the sampling loop
    pub fn probe_mut(&mut self) -> &mut dyn HardwareProbe {
        self.probe.as_mut()
    }

    /// Run the worker to completion while sampling it.
    ///
    /// Only a launch failure or an OS error while polling is reported as an
    /// error; the worker's own exit status is returned in the outcome.
    pub fn run(&mut self, worker: &WorkerCommand) -> Result<MonitorOutcome, MonitorError> {
        let mut child = Command::new(worker.path())
            .args(&worker.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MonitorError::Spawn {
                path: worker.executable.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let pid = Pid::from_u32(child.id());
        info!(pid = child.id(), worker = %worker.executable.display(), "worker started");

        let samples = match self.sample_until_exit(&mut child, pid) {
            Ok(samples) => samples,
            Err(e) => {
                // Reap before reporting so no zombie outlives the run
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        let status = child.wait().map_err(MonitorError::Wait)?;

        let result = WorkerResult {
            exit_code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        info!(
            exit_code = ?result.exit_code,
            samples = samples.len(),
            "worker finished"
        );

        Ok(MonitorOutcome { result, samples })
    }

    fn sample_until_exit(
        &mut self,
        child: &mut Child,
        pid: Pid,
    ) -> Result<Vec<ResourceSample>, MonitorError> {
        let mut samples = Vec::new();
        self.refresh_process(pid);

        while child.try_wait().map_err(MonitorError::Wait)?.is_none() {
            match self.tick(pid) {
                Some(sample) => {
                    debug!(
                        tick = samples.len(),
                        cpu = sample.cpu_percent,
                        ram_mb = sample.ram_mb,
                        "sample"
                    );
                    samples.push(sample);
                }
                None => {
                    debug!("worker vanished during tick");
                    break;
                }
            }
        }

        Ok(samples)
    }

    /// One tick: wait out the measurement window, then read everything.
    ///
    /// A worker that exited during the window is still listed until it is
    /// reaped, so the window's sample is kept. Returns `None` only once the
    /// process entry is gone.
    fn tick(&mut self, pid: Pid) -> Option<ResourceSample> {
        thread::sleep(self.interval);
        self.refresh_process(pid);

        let process = self.system.process(pid)?;
        if matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
            debug!(status = ?process.status(), "worker exited during tick");
        }
        let cpu_percent = process.cpu_usage() as f64;
        let ram_mb = process.memory() as f64 / BYTES_PER_MB;

        Some(ResourceSample {
            cpu_percent,
            ram_mb,
            temp_c: self.probe.temperature_c(),
            freq_mhz: self.probe.cpu_frequency_mhz(),
        })
    }

    fn refresh_process(&mut self, pid: Pid) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}
