//! Configuration loading from arspec.toml
//!
//! arspec configuration can be specified in an `arspec.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Command-line flags override whatever the file sets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Name of the discovered configuration file
pub const CONFIG_FILE: &str = "arspec.toml";

/// arspec configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArspecConfig {
    /// Worker configuration
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Worker artifact locations
    #[serde(default)]
    pub artifacts: ArtifactPaths,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Path to the analysis executable
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
        }
    }
}

fn default_executable() -> PathBuf {
    PathBuf::from("./bin/estimator")
}

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Tick interval (e.g., "100ms")
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Temperature sensor identifiers, tried in order
    #[serde(default = "default_sensors")]
    pub sensors: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            sensors: default_sensors(),
        }
    }
}

fn default_interval() -> String {
    "100ms".to_string()
}
fn default_sensors() -> Vec<String> {
    arspec_monitor::DEFAULT_SENSORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Files exchanged with the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Signal samples the worker analyzes (whitespace-delimited floats)
    #[serde(default = "default_signal")]
    pub signal: PathBuf,
    /// `key:value` metrics written by the worker
    #[serde(default = "default_worker_metrics")]
    pub worker_metrics: PathBuf,
    /// AR coefficients written by the worker
    #[serde(default = "default_coefficients")]
    pub coefficients: PathBuf,
    /// Spectral peaks written by the worker
    #[serde(default = "default_peaks")]
    pub peaks: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            signal: default_signal(),
            worker_metrics: default_worker_metrics(),
            coefficients: default_coefficients(),
            peaks: default_peaks(),
        }
    }
}

fn default_signal() -> PathBuf {
    PathBuf::from("data/audio_signal.txt")
}
fn default_worker_metrics() -> PathBuf {
    PathBuf::from("data/metrics_c_output.txt")
}
fn default_coefficients() -> PathBuf {
    PathBuf::from("data/ar_coeffs.txt")
}
fn default_peaks() -> PathBuf {
    PathBuf::from("data/peaks_output.txt")
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the text report and JSON subset
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl ArspecConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for `arspec.toml`.
    ///
    /// A file that exists but does not parse is reported and ignored.
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        warn!(path = %config_path.display(), error = %e, "ignoring unreadable config");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# arspec Configuration

[worker]
# Analysis executable, invoked as `<executable> <sample_rate> <ar_order>`
executable = "./bin/estimator"

[monitor]
# Sampling tick; also the CPU measurement window
interval = "100ms"
# Temperature sensors, first one present wins
sensors = ["k10temp", "coretemp"]

[artifacts]
# Signal samples read back for residual validation
signal = "data/audio_signal.txt"
# key:value metrics written by the worker
worker_metrics = "data/metrics_c_output.txt"
# AR coefficients written by the worker
coefficients = "data/ar_coeffs.txt"
# Spectral peaks written by the worker
peaks = "data/peaks_output.txt"

[output]
# Directory for <stem>_metrics.txt and <stem>_plot_metrics.json
directory = "results"
"#
        .to_string()
    }

    /// Tick interval, falling back to the default on a bad duration string
    pub fn interval(&self) -> Duration {
        Self::parse_duration(&self.monitor.interval).unwrap_or_else(|e| {
            warn!(interval = %self.monitor.interval, error = %e, "using default interval");
            arspec_monitor::DEFAULT_INTERVAL
        })
    }

    /// Parse duration string (e.g., "100ms", "1s", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration number: {}", num_part));
        }

        let multiplier: f64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" | "min" => 60_000_000_000.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArspecConfig::default();
        assert_eq!(config.worker.executable, PathBuf::from("./bin/estimator"));
        assert_eq!(config.monitor.sensors, vec!["k10temp", "coretemp"]);
        assert_eq!(config.interval(), Duration::from_millis(100));
        assert_eq!(config.output.directory, PathBuf::from("results"));
        assert_eq!(
            config.artifacts.peaks,
            PathBuf::from("data/peaks_output.txt")
        );
    }

    #[test]
    fn test_parse_duration() {
        let parse = |s| ArspecConfig::parse_duration(s).unwrap();
        assert_eq!(parse("100ms"), Duration::from_millis(100));
        assert_eq!(parse("3s"), Duration::from_secs(3));
        assert_eq!(parse("250us"), Duration::from_micros(250));
        assert_eq!(parse("1000ns"), Duration::from_nanos(1000));
        assert_eq!(parse("2m"), Duration::from_secs(120));
        assert_eq!(parse("1.5s"), Duration::from_millis(1500));
        assert_eq!(parse("2"), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(ArspecConfig::parse_duration("").is_err());
        assert!(ArspecConfig::parse_duration("fast").is_err());
        assert!(ArspecConfig::parse_duration("10 parsecs").is_err());
        assert!(ArspecConfig::parse_duration("-5ms").is_err());
    }

    #[test]
    fn test_bad_interval_falls_back() {
        let mut config = ArspecConfig::default();
        config.monitor.interval = "soon".to_string();
        assert_eq!(config.interval(), arspec_monitor::DEFAULT_INTERVAL);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [monitor]
            interval = "50ms"

            [artifacts]
            peaks = "out/peaks.csv"
        "#;

        let config: ArspecConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.interval(), Duration::from_millis(50));
        assert_eq!(config.artifacts.peaks, PathBuf::from("out/peaks.csv"));
        // Defaults should still apply
        assert_eq!(config.monitor.sensors.len(), 2);
        assert_eq!(
            config.artifacts.signal,
            PathBuf::from("data/audio_signal.txt")
        );
    }

    #[test]
    fn test_default_toml_parses() {
        let config: ArspecConfig = toml::from_str(&ArspecConfig::default_toml()).unwrap();
        assert_eq!(config.artifacts, ArtifactPaths::default());
        assert_eq!(config.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[output]\ndirectory = \"reports\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = ArspecConfig::discover_from(&nested).unwrap();
        assert_eq!(config.output.directory, PathBuf::from("reports"));
    }

    #[test]
    fn test_discover_ignores_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[output\n").unwrap();
        assert!(ArspecConfig::discover_from(dir.path()).is_none());
    }
}
