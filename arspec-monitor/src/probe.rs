//! Hardware Probes
//!
//! Optional system readings that are not tied to the worker process. Each
//! method answers `None` when the platform cannot provide the value; the
//! default implementations make [`NullProbe`] a no-op.
//!
//! The implementation is chosen at build time by [`platform_probe`]:
//! [`SysinfoProbe`] on Linux, Windows and macOS, [`NullProbe`] elsewhere.

use regex::Regex;
use tracing::debug;

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
use sysinfo::{Components, CpuRefreshKind, RefreshKind, System};

/// Temperature sensors tried in order when none are configured
pub const DEFAULT_SENSORS: &[&str] = &["k10temp", "coretemp"];

/// Source of best-effort hardware readings
pub trait HardwareProbe {
    /// Mean CPU frequency across cores, in MHz
    fn cpu_frequency_mhz(&mut self) -> Option<f64> {
        None
    }

    /// Mean temperature of the first known sensor present, in °C
    fn temperature_c(&mut self) -> Option<f64> {
        None
    }

    /// Configured memory clock as a display string (e.g. `"3200 MT/s"`)
    fn memory_speed(&mut self) -> Option<String> {
        None
    }
}

/// Probe that never answers
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl HardwareProbe for NullProbe {}

/// Probe backed by `sysinfo` plus the platform memory-speed command
#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
pub struct SysinfoProbe {
    system: System,
    sensors: Vec<String>,
}

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
impl SysinfoProbe {
    /// Create a probe that looks for the given sensor identifiers, in order
    pub fn new(sensors: Vec<String>) -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::new().with_cpu(CpuRefreshKind::new().with_frequency()),
            ),
            sensors,
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
impl HardwareProbe for SysinfoProbe {
    fn cpu_frequency_mhz(&mut self) -> Option<f64> {
        self.system.refresh_cpu_frequency();
        let freqs: Vec<f64> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| cpu.frequency())
            .filter(|&mhz| mhz > 0)
            .map(|mhz| mhz as f64)
            .collect();
        if freqs.is_empty() {
            return None;
        }
        Some(freqs.iter().sum::<f64>() / freqs.len() as f64)
    }

    fn temperature_c(&mut self) -> Option<f64> {
        let components = Components::new_with_refreshed_list();
        let readings: Vec<(&str, f64)> = components
            .list()
            .iter()
            .map(|c| (c.label(), c.temperature() as f64))
            .filter(|(_, t)| t.is_finite())
            .collect();
        let labels: Vec<&str> = readings.iter().map(|(label, _)| *label).collect();
        let sensor = select_sensor(&self.sensors, &labels)?;

        let temps: Vec<f64> = readings
            .iter()
            .filter(|(label, _)| label.starts_with(sensor))
            .map(|(_, t)| *t)
            .collect();
        Some(temps.iter().sum::<f64>() / temps.len() as f64)
    }

    fn memory_speed(&mut self) -> Option<String> {
        query_memory_speed()
    }
}

/// Pick the first configured sensor that any component label belongs to.
fn select_sensor<'a>(sensors: &'a [String], labels: &[&str]) -> Option<&'a str> {
    sensors
        .iter()
        .map(String::as_str)
        .find(|sensor| labels.iter().any(|label| label.starts_with(sensor)))
}

/// Build the probe for the platform this binary was compiled for
pub fn platform_probe(sensors: Vec<String>) -> Box<dyn HardwareProbe> {
    #[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
    {
        Box::new(SysinfoProbe::new(sensors))
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        let _ = sensors;
        Box::new(NullProbe)
    }
}

#[cfg(target_os = "linux")]
fn query_memory_speed() -> Option<String> {
    // dmidecode needs root; -n keeps sudo from prompting
    let output = run_quiet("sudo", &["-n", "dmidecode", "-t", "memory"])?;
    parse_dmidecode_speed(&output)
}

#[cfg(target_os = "windows")]
fn query_memory_speed() -> Option<String> {
    let output = run_quiet("wmic", &["memorychip", "get", "configuredclockspeed"])?;
    parse_wmic_speed(&output)
}

#[cfg(target_os = "macos")]
fn query_memory_speed() -> Option<String> {
    None
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
fn run_quiet(program: &str, args: &[&str]) -> Option<String> {
    use std::process::{Command, Stdio};

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| debug!(program, error = %e, "memory speed probe failed to start"))
        .ok()?;
    if !output.status.success() {
        debug!(program, status = ?output.status.code(), "memory speed probe failed");
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// Extract the first numeric "Configured Memory Speed" from `dmidecode -t memory`.
pub fn parse_dmidecode_speed(output: &str) -> Option<String> {
    let re = Regex::new(r"Configured (?:Memory|Clock) Speed:\s*(\d+)").ok()?;
    let speed = re.captures(output)?.get(1)?.as_str();
    Some(format!("{} MT/s", speed))
}

/// Extract the first module clock from `wmic memorychip get configuredclockspeed`.
pub fn parse_wmic_speed(output: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^\s*(\d+)\s*$").ok()?;
    let speed = re.captures(output)?.get(1)?.as_str();
    Some(format!("{} MHz", speed))
}
