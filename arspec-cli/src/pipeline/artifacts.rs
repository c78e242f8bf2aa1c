//! Worker artifact ingestion
//!
//! The worker communicates through plain-text files. Readers here either hand
//! back typed data or an [`ArtifactError`]; the `*_or_empty` variants log the
//! failure and degrade to an empty value so the run can continue.

use arspec_report::{Peak, WorkerMetrics};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Failures reading a worker artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The file could not be read
    #[error("Could not read {}: {source}", .path.display())]
    Read {
        /// Artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line did not have the expected shape
    #[error("{}:{line}: {reason}", .path.display())]
    Malformed {
        /// Artifact path
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The file held no data
    #[error("{} contains no data", .path.display())]
    Empty {
        /// Artifact path
        path: PathBuf,
    },
}

fn read(path: &Path) -> Result<String, ArtifactError> {
    std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `key:value` lines.
///
/// Blank lines are ignored; a line without a colon or with a non-numeric or
/// non-finite value is skipped with a warning. A repeated key keeps its last
/// value.
pub fn parse_worker_metrics(contents: &str) -> WorkerMetrics {
    let mut metrics = WorkerMetrics::default();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            warn!(line = index + 1, content = line, "worker metric without ':' skipped");
            continue;
        };
        match value.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => metrics.insert(key.trim(), value),
            Ok(value) => {
                warn!(line = index + 1, key = key.trim(), value, "non-finite worker metric skipped")
            }
            Err(_) => {
                warn!(line = index + 1, key = key.trim(), "non-numeric worker metric skipped")
            }
        }
    }
    metrics
}

/// Read the worker metrics file, yielding an empty map if it is missing
pub fn read_worker_metrics(path: &Path) -> WorkerMetrics {
    match read(path) {
        Ok(contents) => {
            let metrics = parse_worker_metrics(&contents);
            debug!(keys = metrics.len(), "worker metrics loaded");
            metrics
        }
        Err(e) => {
            warn!("Could not read worker metrics: {}", e);
            WorkerMetrics::default()
        }
    }
}

/// Parse whitespace-delimited floats (any mix of spaces and newlines).
pub fn parse_floats(contents: &str, path: &Path) -> Result<Vec<f64>, ArtifactError> {
    let mut values = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| ArtifactError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                reason: format!("'{}' is not a number", token),
            })?;
            values.push(value);
        }
    }
    if values.is_empty() {
        return Err(ArtifactError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(values)
}

/// Read a whitespace-delimited float file (signal samples or AR coefficients)
pub fn read_floats(path: &Path) -> Result<Vec<f64>, ArtifactError> {
    parse_floats(&read(path)?, path)
}

/// Parse `frequency, power, bandwidth` rows.
///
/// Everything after a `#` is a comment; lines left blank are ignored. Any
/// malformed row fails the whole file.
pub fn parse_peaks(contents: &str, path: &Path) -> Result<Vec<Peak>, ArtifactError> {
    let mut peaks = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: String| ArtifactError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(malformed(format!("expected 3 fields, found {}", fields.len())));
        }
        let mut numbers = [0.0; 3];
        for (slot, field) in numbers.iter_mut().zip(&fields) {
            *slot = field
                .parse::<f64>()
                .map_err(|_| malformed(format!("'{}' is not a number", field)))?;
        }
        peaks.push(Peak {
            frequency_hz: numbers[0],
            power_db: numbers[1],
            bandwidth_hz: numbers[2],
        });
    }
    Ok(peaks)
}

/// Read the peaks file, yielding no peaks if it is missing or malformed
pub fn read_peaks_or_empty(path: &Path) -> Vec<Peak> {
    match read(path).and_then(|contents| parse_peaks(&contents, path)) {
        Ok(peaks) => {
            if peaks.is_empty() {
                warn!(path = %path.display(), "peaks file has no data rows");
            }
            peaks
        }
        Err(e) => {
            warn!("Could not read peak data: {}", e);
            Vec::new()
        }
    }
}
