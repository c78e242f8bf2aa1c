//! JSON Output
//!
//! Condensed, flat subset of the record for downstream plotting tools. The
//! key set is fixed; unavailable values are the string `"N/A"`.

use crate::record::{Metric, MetricsRecord};
use crate::UNAVAILABLE;
use serde::Serialize;

/// Fixed-schema metrics consumed by the plotting tools
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotMetrics {
    /// Wall-clock seconds for the whole run
    pub total_execution_time_s: f64,
    /// Worker CPU seconds
    pub cpu_time_c: Metric<f64>,
    /// Peak worker CPU utilization
    pub peak_cpu_percent: f64,
    /// Mean worker CPU utilization
    pub avg_cpu_percent: f64,
    /// Peak worker resident memory
    pub peak_ram_mb: f64,
    /// Mean worker resident memory
    pub avg_ram_mb: f64,
    /// Configured memory clock
    pub memory_speed: Metric<String>,
    /// `"Yes"`, `"No"` or `"N/A"`
    pub is_gaussian: &'static str,
    /// p-value of the residual normality test
    pub gaussianity_p_value: Metric<f64>,
    /// AR order used by the worker
    pub used_ar_order: Metric<f64>,
}

impl From<&MetricsRecord> for PlotMetrics {
    fn from(record: &MetricsRecord) -> Self {
        Self {
            total_execution_time_s: record.total_elapsed_s,
            cpu_time_c: record.worker_metrics.cpu_time_s(),
            peak_cpu_percent: record.cpu_percent.peak,
            avg_cpu_percent: record.cpu_percent.mean,
            peak_ram_mb: record.ram_mb.peak,
            avg_ram_mb: record.ram_mb.mean,
            memory_speed: record.memory_speed.clone(),
            is_gaussian: record
                .gaussianity
                .value()
                .map_or(UNAVAILABLE, |g| g.verdict()),
            gaussianity_p_value: record.gaussianity.as_ref().map(|g| g.p_value()),
            used_ar_order: record.worker_metrics.used_ar_order(),
        }
    }
}

/// Generate the prettified JSON subset.
pub fn render_json(record: &MetricsRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&PlotMetrics::from(record))
}
