#![warn(missing_docs)]
//! arspec Report - Metrics Record and Rendering
//!
//! Holds the unified [`MetricsRecord`] of one monitored run and renders it
//! three ways:
//! - Text report (full detail, persisted)
//! - JSON subset (fixed schema for plotting tools, persisted)
//! - Console summary (printed)
//!
//! Every optional value is a [`Metric`]: either a typed value or
//! `Unavailable`, which renders as [`UNAVAILABLE`] on every surface.

mod console;
mod json;
mod record;
mod text;
mod writer;

pub use console::render_console;
pub use json::{PlotMetrics, render_json};
pub use record::{
    Gaussianity, Metric, MetricsRecord, Peak, UNAVAILABLE, WorkerMetrics, ranked_by_power,
};
pub use text::render_text;
pub use writer::{RenderedReports, ReportPaths, render, write_reports};

pub use arspec_stats::ResourceStats;
