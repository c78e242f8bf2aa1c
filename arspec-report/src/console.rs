//! Console Summary
//!
//! Short end-of-run summary printed to stdout; never persisted.

use crate::record::{MetricsRecord, ranked_by_power};
use crate::UNAVAILABLE;

/// Render the console summary
pub fn render_console(record: &MetricsRecord) -> String {
    let mut output = String::new();

    output.push_str("\n--- ANALYSIS SUMMARY ---\n");
    output.push_str(&format!("Total Time: {:.2} s\n", record.total_elapsed_s));
    output.push_str(&format!(
        "CPU Usage (Peak/Avg): {:.2}% / {:.2}%\n",
        record.cpu_percent.peak, record.cpu_percent.mean
    ));
    output.push_str(&format!(
        "RAM Usage (Peak/Avg): {:.2} MB / {:.2} MB\n",
        record.ram_mb.peak, record.ram_mb.mean
    ));

    match record.freq_mhz.value() {
        Some(freq) => output.push_str(&format!(
            "CPU Freq (Peak/Avg): {:.2} MHz / {:.2} MHz\n",
            freq.peak, freq.mean
        )),
        None => output.push_str(&format!("CPU Freq: {}\n", UNAVAILABLE)),
    }
    match record.temp_c.value() {
        Some(temp) => output.push_str(&format!(
            "CPU Temp (Peak/Avg): {:.2}°C / {:.2}°C\n",
            temp.peak, temp.mean
        )),
        None => output.push_str(&format!("CPU Temp: {}\n", UNAVAILABLE)),
    }
    output.push_str(&format!("RAM Freq: {}\n", record.memory_speed.display()));

    match record.gaussianity.value() {
        Some(g) => output.push_str(&format!(
            "Model Validation (Residual): {} (p={:.3})\n",
            g.verdict(),
            g.p_value()
        )),
        None => output.push_str(&format!("Model Validation (Residual): {}\n", UNAVAILABLE)),
    }
    output.push_str(&format!(
        "AR Order Used: {}\n",
        record.worker_metrics.used_ar_order().fixed(0)
    ));

    for peak in ranked_by_power(&record.peaks) {
        output.push_str(&format!(
            "  - Freq: {:.2} Hz | Power: {:.2} dB | Width: {:.2} Hz\n",
            peak.frequency_hz, peak.power_db, peak.bandwidth_hz
        ));
    }

    output
}
