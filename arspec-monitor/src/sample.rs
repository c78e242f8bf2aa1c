//! Sample and result types produced by a monitored run

/// Bytes per megabyte (binary) used for resident memory readings
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Resource readings captured during one monitoring tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSample {
    /// Worker CPU utilization over the tick, in percent of one core
    pub cpu_percent: f64,
    /// Worker resident memory in MB
    pub ram_mb: f64,
    /// System temperature in °C, when a known sensor answered
    pub temp_c: Option<f64>,
    /// Mean system CPU frequency in MHz, when the platform reports it
    pub freq_mhz: Option<f64>,
}

/// Exit status and captured output of the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResult {
    /// Exit code, or `None` if the worker was terminated by a signal
    pub exit_code: Option<i32>,
    /// Everything the worker wrote to stdout
    pub stdout: Vec<u8>,
    /// Everything the worker wrote to stderr, byte for byte
    pub stderr: Vec<u8>,
}

impl WorkerResult {
    /// Whether the worker exited normally with code 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Lossy UTF-8 view of the captured stderr
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Everything a monitored run hands to the aggregation stage
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    /// Worker exit status and output
    pub result: WorkerResult,
    /// Samples in tick order
    pub samples: Vec<ResourceSample>,
}
