#![warn(missing_docs)]
//! arspec Monitor - Worker Supervision
//!
//! Launches the external analysis worker and samples its resource usage
//! until it exits:
//! - CPU utilization of the worker over each tick
//! - Resident memory of the worker
//! - System CPU frequency and temperature through a [`HardwareProbe`]
//!
//! Hardware details are best-effort; a probe that cannot answer simply leaves
//! the reading out of the tick.

mod monitor;
mod probe;
mod sample;

pub use monitor::{DEFAULT_INTERVAL, MonitorError, ProcessMonitor, WorkerCommand};
pub use probe::{
    DEFAULT_SENSORS, HardwareProbe, NullProbe, parse_dmidecode_speed, parse_wmic_speed,
    platform_probe,
};
#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
pub use probe::SysinfoProbe;
pub use sample::{BYTES_PER_MB, MonitorOutcome, ResourceSample, WorkerResult};
