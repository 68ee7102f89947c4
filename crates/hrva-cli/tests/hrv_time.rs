use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};

#[derive(Deserialize)]
struct HrvTimeOutput {
    n: usize,
    mean_nni: f64,
    sdnn: Option<f64>,
    rmssd: Option<f64>,
    nni_20: Option<usize>,
    nni_50: Option<usize>,
    mean_hr: f64,
}

fn sample_path(rel: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(rel)
        .to_string_lossy()
        .to_string()
}

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn hrv_time_matches_reference_values() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.args(["hrv-time", "--input", &sample_path("test_data/tiny_rr.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvTimeOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.n, 20);
    assert_close(value.mean_nni, 814.1, 1e-9);
    assert_close(value.sdnn.unwrap(), 20.968397273290257, 1e-9);
    assert_close(value.rmssd.unwrap(), 19.70840055995359, 1e-9);
    assert_eq!(value.nni_20, Some(10));
    assert_eq!(value.nni_50, Some(0));
    assert!(value.mean_hr > 70.0 && value.mean_hr < 80.0);
    Ok(())
}

#[test]
fn hrv_time_reads_stdin() -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(sample_path("test_data/tiny_rr.txt"))?;
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.arg("hrv-time").write_stdin(text);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvTimeOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.n, 20);
    Ok(())
}

#[test]
fn hrv_time_reads_csv_column() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.args([
        "hrv-time",
        "--input",
        &sample_path("test_data/rr_recording.csv"),
        "--csv-column",
        "rr_ms",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvTimeOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.n, 300);
    Ok(())
}

#[test]
fn hrv_time_rejects_non_positive_intervals() {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.arg("hrv-time").write_stdin("800\n0\n810\n");
    cmd.assert().failure();
}
