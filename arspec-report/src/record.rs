//! Metrics Record Data Structures

use arspec_stats::{ResourceStats, is_gaussian};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Marker rendered for any value that could not be obtained
pub const UNAVAILABLE: &str = "N/A";

/// A value that is either known or explicitly unavailable
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Metric<T> {
    /// Measured or parsed value
    Value(T),
    /// The stage producing this value failed or had nothing to report
    #[default]
    Unavailable,
}

impl<T> Metric<T> {
    /// Borrow the value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::Unavailable => None,
        }
    }

    /// Whether a value is present
    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Value(_))
    }

    /// Transform the value, keeping `Unavailable` as is
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Value(v) => Metric::Value(f(v)),
            Metric::Unavailable => Metric::Unavailable,
        }
    }

    /// Borrowing view
    pub fn as_ref(&self) -> Metric<&T> {
        match self {
            Metric::Value(v) => Metric::Value(v),
            Metric::Unavailable => Metric::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Metric::Value(v),
            None => Metric::Unavailable,
        }
    }
}

impl Metric<f64> {
    /// Fixed-point rendering, or the unavailable marker
    pub fn fixed(&self, precision: usize) -> String {
        match self {
            Metric::Value(v) => format!("{:.*}", precision, v),
            Metric::Unavailable => UNAVAILABLE.to_string(),
        }
    }

    /// Fixed-point rendering followed by a unit, or the unavailable marker
    pub fn with_unit(&self, precision: usize, unit: &str) -> String {
        match self {
            Metric::Value(v) => format!("{:.*} {}", precision, v, unit),
            Metric::Unavailable => UNAVAILABLE.to_string(),
        }
    }
}

impl Metric<ResourceStats> {
    /// Peak of the reduced series
    pub fn peak(&self) -> Metric<f64> {
        self.as_ref().map(|s| s.peak)
    }

    /// Mean of the reduced series
    pub fn mean(&self) -> Metric<f64> {
        self.as_ref().map(|s| s.mean)
    }
}

impl Metric<String> {
    /// The string, or the unavailable marker
    pub fn display(&self) -> &str {
        match self {
            Metric::Value(v) => v,
            Metric::Unavailable => UNAVAILABLE,
        }
    }
}

impl<T: Serialize> Serialize for Metric<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => v.serialize(serializer),
            Metric::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// Spectral peak reported by the worker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Centre frequency in Hz
    pub frequency_hz: f64,
    /// Peak power in dB
    pub power_db: f64,
    /// Width at -3 dB in Hz
    pub bandwidth_hz: f64,
}

/// Peaks ordered by descending power.
///
/// The sort is stable, so peaks of equal power keep their input order.
pub fn ranked_by_power(peaks: &[Peak]) -> Vec<Peak> {
    let mut ranked = peaks.to_vec();
    ranked.sort_by(|a, b| b.power_db.total_cmp(&a.power_db));
    ranked
}

/// Residual normality verdict; the p-value and the verdict always travel together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussianity {
    p_value: f64,
    is_gaussian: bool,
}

impl Gaussianity {
    /// Classify a p-value (Gaussian when `p >= 0.05`)
    pub fn from_p_value(p_value: f64) -> Self {
        Self {
            p_value,
            is_gaussian: is_gaussian(p_value),
        }
    }

    /// p-value of the normality test
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// Whether the residual is consistent with Gaussian noise
    pub fn is_gaussian(&self) -> bool {
        self.is_gaussian
    }

    /// `"Yes"` or `"No"`
    pub fn verdict(&self) -> &'static str {
        if self.is_gaussian {
            "Yes"
        } else {
            "No"
        }
    }
}

/// Key/value metrics declared by the worker
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkerMetrics {
    values: BTreeMap<String, f64>,
}

impl WorkerMetrics {
    /// CPU seconds the worker measured for itself
    pub const CPU_TIME: &'static str = "cpu_time_c";
    /// AR model order the worker actually fitted
    pub const USED_AR_ORDER: &'static str = "used_ar_order";
    /// Variance of the AR model's driving noise
    pub const NOISE_VARIANCE: &'static str = "noise_variance";

    const KNOWN: [&'static str; 3] = [Self::CPU_TIME, Self::USED_AR_ORDER, Self::NOISE_VARIANCE];

    /// Record a value; a repeated key keeps the last value
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Look up any key
    pub fn get(&self, key: &str) -> Metric<f64> {
        self.values.get(key).copied().into()
    }

    /// Worker CPU time in seconds
    pub fn cpu_time_s(&self) -> Metric<f64> {
        self.get(Self::CPU_TIME)
    }

    /// AR order used by the worker
    pub fn used_ar_order(&self) -> Metric<f64> {
        self.get(Self::USED_AR_ORDER)
    }

    /// Residual noise variance of the AR model
    pub fn noise_variance(&self) -> Metric<f64> {
        self.get(Self::NOISE_VARIANCE)
    }

    /// Keys the report has no dedicated line for, in key order
    pub fn extra(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .filter(|(k, _)| !Self::KNOWN.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key was parsed
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for WorkerMetrics {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Everything known about one successful worker run
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    /// File name of the analyzed input
    pub input_name: String,
    /// Worker exit code (always 0 for an aggregated run)
    pub exit_code: i32,
    /// Number of monitoring ticks
    pub sample_count: usize,
    /// Worker CPU utilization in percent
    pub cpu_percent: ResourceStats,
    /// Worker resident memory in MB
    pub ram_mb: ResourceStats,
    /// System temperature in °C
    pub temp_c: Metric<ResourceStats>,
    /// System CPU frequency in MHz
    pub freq_mhz: Metric<ResourceStats>,
    /// Metrics the worker wrote about itself
    pub worker_metrics: WorkerMetrics,
    /// Spectral peaks in file order
    pub peaks: Vec<Peak>,
    /// Residual normality verdict
    pub gaussianity: Metric<Gaussianity>,
    /// Wall-clock seconds from pipeline start to aggregation
    pub total_elapsed_s: f64,
    /// Configured memory clock, as reported by the platform
    pub memory_speed: Metric<String>,
}
