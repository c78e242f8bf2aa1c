//! End-to-end runs against a shell-script worker
#![cfg(unix)]

use arspec_cli::{ArtifactPaths, PipelineError, RunOptions, run_pipeline_with};
use arspec_monitor::{MonitorError, NullProbe};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn artifacts(&self) -> ArtifactPaths {
        ArtifactPaths {
            signal: self.path("data/audio_signal.txt"),
            worker_metrics: self.path("data/metrics_c_output.txt"),
            coefficients: self.path("data/ar_coeffs.txt"),
            peaks: self.path("data/peaks_output.txt"),
        }
    }

    fn write_signal(&self) {
        // Deterministic noise: sum of twelve LCG uniforms per sample
        let mut state: u64 = 42;
        let mut uniform = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        let samples: Vec<String> = (0..1000)
            .map(|_| ((0..12).map(|_| uniform()).sum::<f64>() - 6.0).to_string())
            .collect();
        std::fs::write(self.artifacts().signal, samples.join("\n")).unwrap();
    }

    /// Write an executable shell script and return its path
    fn worker(&self, body: &str) -> PathBuf {
        let path = self.path("estimator.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Worker that writes every artifact and records its arguments
    fn successful_worker(&self) -> PathBuf {
        let artifacts = self.artifacts();
        self.worker(&format!(
            r#"echo "$1 $2" > '{args}'
printf 'cpu_time_c:1.234000\nused_ar_order:8\nnoise_variance:0.000001000000\n' > '{metrics}'
printf '1.0\n' > '{coeffs}'
printf '# Frequency (Hz), Power (dB), Bandwidth at -3dB (Hz)\n60.0000, -20.5000, 0.8000\n' > '{peaks}'
sleep 0.3
echo done
"#,
            args = self.path("args.txt").display(),
            metrics = artifacts.worker_metrics.display(),
            coeffs = artifacts.coefficients.display(),
            peaks = artifacts.peaks.display(),
        ))
    }

    fn options(&self, worker: PathBuf) -> RunOptions {
        RunOptions {
            input: PathBuf::from("/recordings/recording.wav"),
            sample_rate: 44_100,
            ar_order: 8,
            worker,
            artifacts: self.artifacts(),
            output_dir: self.path("results"),
            interval: Duration::from_millis(20),
            sensors: Vec::new(),
        }
    }

    fn write_config(&self) -> PathBuf {
        let artifacts = self.artifacts();
        let path = self.path("arspec.toml");
        let contents = format!(
            r#"[monitor]
interval = "20ms"

[artifacts]
signal = '{}'
worker_metrics = '{}'
coefficients = '{}'
peaks = '{}'

[output]
directory = '{}'
"#,
            artifacts.signal.display(),
            artifacts.worker_metrics.display(),
            artifacts.coefficients.display(),
            artifacts.peaks.display(),
            self.path("results").display(),
        );
        std::fs::write(&path, contents).unwrap();
        path
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_successful_run_writes_reports() {
    let ws = Workspace::new();
    ws.write_signal();
    let worker = ws.successful_worker();

    let summary = run_pipeline_with(&ws.options(worker), Box::new(NullProbe)).unwrap();

    assert_eq!(read(&ws.path("args.txt")).trim(), "44100 8");
    assert_eq!(summary.paths.text, ws.path("results/recording_metrics.txt"));
    assert_eq!(
        summary.paths.json,
        ws.path("results/recording_plot_metrics.json")
    );
    assert!(summary.record.sample_count > 0);
    assert!(summary.record.total_elapsed_s >= 0.3);

    let text = read(&summary.paths.text);
    assert_eq!(text, summary.reports.text);
    assert!(text.contains("File Analyzed: recording.wav\n"));
    assert!(text.contains("Analyzer CPU Time: 1.2340 s\n"));
    assert!(text.contains("Model Order Used: 8\n"));
    assert!(text.contains("Residual Noise Variance: 0.000001000000\n"));
    assert!(text.contains("RAM Frequency (Configured): N/A\n"));
    assert!(text.contains(
        "  Peak #1 (sorted by power):\n    Frequency: 60.00 Hz\n    Power: -20.50 dB\n    Width (-3dB): 0.80 Hz (precision metric)\n"
    ));
    assert!(!text.contains("Peak #2"));

    // Identity whitening of the stored signal gives a real verdict
    let gaussianity = summary.record.gaussianity.value().copied().unwrap();
    assert!(text.contains(&format!("Result: {}\n", gaussianity.verdict())));

    let json: serde_json::Value = serde_json::from_str(&read(&summary.paths.json)).unwrap();
    assert_eq!(json["used_ar_order"].as_f64(), Some(8.0));
    assert_eq!(json["cpu_time_c"].as_f64(), Some(1.234));
    assert_eq!(json["memory_speed"], "N/A");
    assert_eq!(json["is_gaussian"], gaussianity.verdict());

    assert!(summary.reports.console.contains("AR Order Used: 8\n"));
    assert!(summary
        .reports
        .console
        .contains("  - Freq: 60.00 Hz | Power: -20.50 dB | Width: 0.80 Hz\n"));
}

#[test]
fn test_missing_artifacts_degrade() {
    let ws = Workspace::new();
    let worker = ws.worker("exit 0\n");

    let summary = run_pipeline_with(&ws.options(worker), Box::new(NullProbe)).unwrap();

    let text = read(&summary.paths.text);
    assert!(text.contains("Model Order Used: N/A\n"));
    assert!(text.contains("Result: N/A\np-value: N/A\n"));
    assert!(text.contains("  No significant peaks were detected.\n"));

    let json: serde_json::Value = serde_json::from_str(&summary.reports.json).unwrap();
    assert_eq!(json["is_gaussian"], "N/A");
    assert_eq!(json["used_ar_order"], "N/A");
}

#[test]
fn test_failed_worker_writes_nothing() {
    let ws = Workspace::new();
    let worker = ws.worker("printf 'bad input: \\377\\n' >&2\nexit 2\n");

    let err = run_pipeline_with(&ws.options(worker), Box::new(NullProbe)).unwrap_err();

    match err {
        PipelineError::WorkerFailed { exit_code, stderr } => {
            assert_eq!(exit_code, Some(2));
            assert_eq!(stderr, b"bad input: \xff\n");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ws.path("results").exists());
}

#[test]
fn test_unlaunchable_worker() {
    let ws = Workspace::new();
    let err = run_pipeline_with(&ws.options(ws.path("no-such-worker")), Box::new(NullProbe))
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Monitor(MonitorError::Spawn { .. })
    ));
    assert!(!ws.path("results").exists());
}

#[test]
fn test_binary_success_and_exit_codes() {
    let ws = Workspace::new();
    ws.write_signal();
    let worker = ws.successful_worker();
    let config = ws.write_config();

    let output = Command::new(env!("CARGO_BIN_EXE_arspec"))
        .arg("--config")
        .arg(&config)
        .arg("--worker")
        .arg(&worker)
        .args(["--sample-rate", "44100", "take_1.wav", "8"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--- ANALYSIS SUMMARY ---"));
    assert!(stdout.contains("AR Order Used: 8"));
    assert!(stdout.contains("Full report saved to: '"));
    assert!(ws.path("results/take_1_metrics.txt").exists());
    assert!(ws.path("results/take_1_plot_metrics.json").exists());
}

#[test]
fn test_binary_worker_failure() {
    let ws = Workspace::new();
    let worker = ws.worker("echo 'estimator: bad order' >&2\nexit 3\n");
    let config = ws.write_config();

    let output = Command::new(env!("CARGO_BIN_EXE_arspec"))
        .arg("--config")
        .arg(&config)
        .arg("--worker")
        .arg(&worker)
        .args(["--sample-rate", "44100", "take_1.wav", "8"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--- ERROR DURING WORKER EXECUTION ---\nestimator: bad order\n"));
    assert!(!ws.path("results").exists());
}

#[test]
fn test_binary_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_arspec"))
        .args(["take_1.wav", "8"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_binary_init_prints_config() {
    let output = Command::new(env!("CARGO_BIN_EXE_arspec"))
        .arg("init")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let config: arspec_cli::ArspecConfig =
        toml::from_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(config.output.directory, PathBuf::from("results"));
}
