use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, path::PathBuf};

#[derive(Deserialize)]
struct Masked {
    samples: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct Nn {
    rr: Vec<f64>,
}

#[derive(Deserialize)]
struct Quality {
    acceptable: bool,
    beats: usize,
}

#[derive(Deserialize)]
struct CleanOutput {
    raw_len: usize,
    range_outliers: usize,
    ectopic_beats: usize,
    method: String,
    masked: Masked,
    nn: Nn,
    quality: Quality,
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(rel: &str) -> String {
    workspace_root().join(rel).to_string_lossy().to_string()
}

#[test]
fn clean_removes_artifact_and_ectopic_beat() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.args(["clean", "--input", &sample_path("test_data/rr_recording.txt")]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let actual: CleanOutput = serde_json::from_slice(&output)?;

    assert_eq!(actual.raw_len, 300);
    assert_eq!(actual.method, "malik");
    assert_eq!(actual.range_outliers, 1);
    assert_eq!(actual.ectopic_beats, 1);
    assert!(actual.masked.samples[120].is_none());
    assert!(actual.masked.samples[200].is_none());
    assert_eq!(actual.nn.rr.len(), 300);
    assert!(actual.nn.rr.iter().all(|v| (770.0..=870.0).contains(v)));
    assert!(actual.quality.acceptable);
    assert_eq!(actual.quality.beats, 300);
    Ok(())
}

#[test]
fn clean_accepts_method_override() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.args([
        "clean",
        "--input",
        &sample_path("test_data/rr_recording.csv"),
        "--csv-column",
        "RR_MS",
        "--method",
        "acar",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let actual: CleanOutput = serde_json::from_slice(&output)?;
    assert_eq!(actual.method, "acar");
    assert_eq!(actual.range_outliers, 1);
    assert!(actual.masked.samples[120].is_none());
    Ok(())
}

#[test]
fn clean_rejects_unknown_method() {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.args([
        "clean",
        "--input",
        &sample_path("test_data/rr_recording.txt"),
        "--method",
        "bogus",
    ]);
    cmd.assert().failure();
}

#[test]
fn clean_fails_when_every_interval_is_out_of_range() {
    let mut cmd = cargo_bin_cmd!("hrva");
    cmd.arg("clean").write_stdin("100\n2500\n150\n");
    cmd.assert().failure();
}
