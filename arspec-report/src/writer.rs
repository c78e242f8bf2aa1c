//! Report Writer
//!
//! Renders all three surfaces at once and persists the text report and JSON
//! subset under names derived from the analyzed input.

use crate::console::render_console;
use crate::json::render_json;
use crate::record::MetricsRecord;
use crate::text::render_text;
use std::path::{Path, PathBuf};

/// Stem used when the input has no usable file name
const FALLBACK_STEM: &str = "analysis";

/// The three renderings of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReports {
    /// Full text report
    pub text: String,
    /// JSON subset
    pub json: String,
    /// Console summary
    pub console: String,
}

/// Render every surface of `record`
pub fn render(record: &MetricsRecord) -> Result<RenderedReports, serde_json::Error> {
    Ok(RenderedReports {
        text: render_text(record),
        json: render_json(record)?,
        console: render_console(record),
    })
}

/// Where the persisted reports go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// `<dir>/<stem>_metrics.txt`
    pub text: PathBuf,
    /// `<dir>/<stem>_plot_metrics.json`
    pub json: PathBuf,
}

impl ReportPaths {
    /// Derive both paths from the analyzed input's base name
    pub fn for_input(output_dir: &Path, input: &Path) -> Self {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_STEM);

        Self {
            text: output_dir.join(format!("{}_metrics.txt", stem)),
            json: output_dir.join(format!("{}_plot_metrics.json", stem)),
        }
    }
}

/// Write the text report and JSON subset, creating parent directories
pub fn write_reports(reports: &RenderedReports, paths: &ReportPaths) -> std::io::Result<()> {
    for (path, contents) in [(&paths.text, &reports.text), (&paths.json, &reports.json)] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
    }
    Ok(())
}
