//! Text Report
//!
//! Full human-readable report, persisted next to the JSON subset.
//!
//! Sections: header, performance metrics, AR model metrics, Gaussianity
//! validation, ranked peak list.

use crate::record::{Metric, MetricsRecord, ranked_by_power};

const RULE_HEADER: &str = "--- Spectral Analysis and Performance Report ---";

/// Render the full text report
pub fn render_text(record: &MetricsRecord) -> String {
    let mut output = String::new();

    output.push_str(RULE_HEADER);
    output.push_str("\n\n");
    output.push_str(&format!("File Analyzed: {}\n", record.input_name));

    output.push_str("\n--- Performance and Hardware Resource Metrics ---\n");
    output.push_str(&format!(
        "Total Execution Time (full workflow): {:.4} s\n",
        record.total_elapsed_s
    ));
    output.push_str(&format!(
        "Analyzer CPU Time: {}\n",
        record.worker_metrics.cpu_time_s().with_unit(4, "s")
    ));
    output.push_str(&format!("Monitoring Samples: {}\n", record.sample_count));

    let rows: [(&str, Metric<f64>, &str); 8] = [
        (
            "Peak CPU Usage (worker process only)",
            Metric::Value(record.cpu_percent.peak),
            "%",
        ),
        (
            "Average CPU Usage (worker process only)",
            Metric::Value(record.cpu_percent.mean),
            "%",
        ),
        (
            "Peak RAM Usage (worker process only)",
            Metric::Value(record.ram_mb.peak),
            "MB",
        ),
        (
            "Average RAM Usage (worker process only)",
            Metric::Value(record.ram_mb.mean),
            "MB",
        ),
        ("Peak CPU Frequency", record.freq_mhz.peak(), "MHz"),
        ("Average CPU Frequency", record.freq_mhz.mean(), "MHz"),
        ("Peak CPU Temperature", record.temp_c.peak(), "°C"),
        ("Average CPU Temperature", record.temp_c.mean(), "°C"),
    ];
    for (label, value, unit) in rows {
        output.push_str(&format!("{}: {}\n", label, value.with_unit(2, unit)));
    }
    output.push_str(&format!(
        "RAM Frequency (Configured): {}\n",
        record.memory_speed.display()
    ));

    output.push_str("\n--- AR Model Metrics ---\n");
    output.push_str(&format!(
        "Model Order Used: {}\n",
        record.worker_metrics.used_ar_order().fixed(0)
    ));
    output.push_str(&format!(
        "Residual Noise Variance: {}\n",
        record.worker_metrics.noise_variance().fixed(12)
    ));

    let extra: Vec<_> = record.worker_metrics.extra().collect();
    if !extra.is_empty() {
        output.push_str("\n--- Additional Worker Metrics ---\n");
        for (key, value) in extra {
            output.push_str(&format!("{}: {}\n", key, value));
        }
    }

    output.push_str("\n--- Model Validation (Residual Gaussianity Test) ---\n");
    match record.gaussianity.value() {
        Some(g) => {
            output.push_str(&format!("Result: {}\n", g.verdict()));
            output.push_str(&format!(
                "p-value: {:.4} (considered Gaussian if p >= 0.05)\n",
                g.p_value()
            ));
        }
        None => {
            output.push_str(&format!("Result: {}\n", crate::UNAVAILABLE));
            output.push_str(&format!("p-value: {}\n", crate::UNAVAILABLE));
        }
    }

    output.push_str("\n--- Detected Frequency Peaks ---\n");
    if record.peaks.is_empty() {
        output.push_str("  No significant peaks were detected.\n");
    } else {
        for (i, peak) in ranked_by_power(&record.peaks).iter().enumerate() {
            output.push_str(&format!("  Peak #{} (sorted by power):\n", i + 1));
            output.push_str(&format!("    Frequency: {:.2} Hz\n", peak.frequency_hz));
            output.push_str(&format!("    Power: {:.2} dB\n", peak.power_db));
            output.push_str(&format!(
                "    Width (-3dB): {:.2} Hz (precision metric)\n",
                peak.bandwidth_hz
            ));
        }
    }

    output
}
