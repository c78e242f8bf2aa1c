//! Resource Summaries
//!
//! Peak and arithmetic mean over per-tick readings. Non-finite readings are
//! ignored so a single bad sensor value cannot poison the aggregate.

/// Peak and mean of a series of readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceStats {
    /// Largest reading
    pub peak: f64,
    /// Arithmetic mean of the readings
    pub mean: f64,
}

impl ResourceStats {
    /// Reduction of an empty series for metrics that are always measured
    pub const ZERO: ResourceStats = ResourceStats {
        peak: 0.0,
        mean: 0.0,
    };
}

/// Reduce a series of readings to peak and mean.
///
/// Returns `None` when the series holds no finite reading.
pub fn summarize(values: &[f64]) -> Option<ResourceStats> {
    summarize_present(values.iter().map(|&v| Some(v)))
}

/// Reduce the readings that are present, skipping ticks where the metric was
/// not measured.
///
/// Returns `None` when no tick carried the metric.
pub fn summarize_present<I>(values: I) -> Option<ResourceStats>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut peak = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in values.into_iter().flatten().filter(|v| v.is_finite()) {
        peak = peak.max(value);
        sum += value;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(ResourceStats {
        peak,
        mean: sum / count as f64,
    })
}
