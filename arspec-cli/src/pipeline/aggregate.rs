//! Metrics aggregation
//!
//! Fuses the monitor's sample history with the worker's artifacts into one
//! [`MetricsRecord`]. Only the resource reduction is guaranteed; every other
//! stage degrades to `Unavailable` (or empty) with a warning.

use super::artifacts::{self, ArtifactError};
use crate::config::ArtifactPaths;
use arspec_monitor::{HardwareProbe, ResourceSample, WorkerResult};
use arspec_report::{Gaussianity, Metric, MetricsRecord, ResourceStats};
use arspec_stats::{FilterError, NormalityError, normal_test, summarize, summarize_present, whiten};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why the residual could not be validated
#[derive(Debug, Error)]
enum ValidationError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("whitening failed: {0}")]
    Filter(#[from] FilterError),
    #[error("normality test failed: {0}")]
    Normality(#[from] NormalityError),
}

/// Peak/mean of cpu and ram (zero when empty), plus temperature and frequency
/// over the ticks that reported them.
pub fn reduce_samples(
    samples: &[ResourceSample],
) -> (
    ResourceStats,
    ResourceStats,
    Metric<ResourceStats>,
    Metric<ResourceStats>,
) {
    let cpu: Vec<f64> = samples.iter().map(|s| s.cpu_percent).collect();
    let ram: Vec<f64> = samples.iter().map(|s| s.ram_mb).collect();

    (
        summarize(&cpu).unwrap_or(ResourceStats::ZERO),
        summarize(&ram).unwrap_or(ResourceStats::ZERO),
        summarize_present(samples.iter().map(|s| s.temp_c)).into(),
        summarize_present(samples.iter().map(|s| s.freq_mhz)).into(),
    )
}

/// Whiten the signal with the worker's AR coefficients and test the residual.
pub fn validate_residual(artifacts: &ArtifactPaths) -> Metric<Gaussianity> {
    match residual_p_value(artifacts) {
        Ok(p_value) => {
            let gaussianity = Gaussianity::from_p_value(p_value);
            debug!(p_value, gaussian = gaussianity.is_gaussian(), "residual validated");
            Metric::Value(gaussianity)
        }
        Err(e) => {
            warn!("Could not perform Gaussianity test: {}", e);
            Metric::Unavailable
        }
    }
}

fn residual_p_value(artifacts: &ArtifactPaths) -> Result<f64, ValidationError> {
    let coefficients = artifacts::read_floats(&artifacts.coefficients)?;
    let signal = artifacts::read_floats(&artifacts.signal)?;
    let residual = whiten(&coefficients, &signal)?;
    Ok(normal_test(&residual)?.p_value)
}

/// Build the unified record for a successful worker run.
pub fn aggregate(
    samples: Vec<ResourceSample>,
    result: &WorkerResult,
    artifacts: &ArtifactPaths,
    input_name: &str,
    started: Instant,
    probe: &mut dyn HardwareProbe,
) -> MetricsRecord {
    let (cpu_percent, ram_mb, temp_c, freq_mhz) = reduce_samples(&samples);

    let worker_metrics = artifacts::read_worker_metrics(&artifacts.worker_metrics);
    let gaussianity = validate_residual(artifacts);
    let peaks = artifacts::read_peaks_or_empty(&artifacts.peaks);

    let memory_speed: Metric<String> = probe.memory_speed().into();
    if !memory_speed.is_available() {
        warn!("Could not determine memory speed");
    }

    let total_elapsed_s = started.elapsed().as_secs_f64();
    info!(
        samples = samples.len(),
        peaks = peaks.len(),
        elapsed_s = total_elapsed_s,
        "metrics aggregated"
    );

    MetricsRecord {
        input_name: input_name.to_string(),
        exit_code: result.exit_code.unwrap_or_default(),
        sample_count: samples.len(),
        cpu_percent,
        ram_mb,
        temp_c,
        freq_mhz,
        worker_metrics,
        peaks,
        gaussianity,
        total_elapsed_s,
        memory_speed,
    }
}
