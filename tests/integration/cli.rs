//! Command line behaviour of the binary

use assert_cmd::Command;
use std::path::Path;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("places-downloader").unwrap();
    cmd.current_dir(dir)
        .env("RUST_LOG", "off")
        .arg("--usage-file")
        .arg(dir.join("usage.dat"))
        .arg("--prefs-file")
        .arg(dir.join("prefs.dat"));
    cmd
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_validate_accepts_good_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path())
        .args([
            "validate", "--api-key", "k", "--xlsx", "out.xlsx", "--output-dir", "photos", "--lat",
            "12.97", "--lng", "77.59", "--radius", "2", "--keyword", "cafe", "--limit", "5",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Inputs are valid"));
    assert!(text.contains("Radius: 2 km (2000 m)"));
    assert!(text.contains("Photos: not saved"));
}

#[test]
fn test_validate_reports_every_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path())
        .args([
            "validate", "--xlsx", "out.xlsx", "--output-dir", "photos", "--lat", "95", "--lng",
            "east", "--radius", "60", "--keyword", "cafe", "--limit", "-1",
        ])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: longitude is not numeric"));
    assert!(err.contains("Error: latitude must lie between -90 and 90 degrees"));
    assert!(err.contains("Error: radius must lie between 0 and 50 kms"));
    assert!(err.contains("Error: entry limit cannot be negative"));
    assert!(err.contains("Error: places api key needs to be specified"));
}

#[test]
fn test_validate_reads_saved_inputs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("prefs.dat"),
        "GAPI_KEY=k\nXLSX_FILE_PATH=out.xlsx\nOUTPUT_DIR_NAME=photos\nLATITUDE=1.5\nLONGITUDE=2\n\
         RADIUS=10\nKEYWORD=park\nSAVE_LOG=false\nSAVE_IMAGES=true\nLIMIT_ENTRIES=40",
    )
    .unwrap();

    let output = cli(dir.path()).args(["validate", "--radius", "3"]).output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Center: 1.5,2"));
    assert!(text.contains("Radius: 3 km (3000 m)"));
    assert!(text.contains("Limit: 40"));
    assert!(text.contains("Photos: photos"));
}

#[test]
fn test_download_rejects_invalid_inputs_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path())
        .args(["download", "--lat", "12.97", "--lng", "77.59", "--remember"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: radius is not numeric"));
    assert!(!dir.path().join("usage.dat").exists());
    assert!(!dir.path().join("prefs.dat").exists());
}

#[test]
fn test_usage_without_ledger_is_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path()).arg("usage").output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("API usage for month "));
    assert!(text.contains("nearby search: 0"));
    assert!(text.contains("place details: 0"));
    assert!(text.contains("place photo: 0"));
}

#[test]
fn test_usage_json_shows_current_month() {
    let dir = tempfile::tempdir().unwrap();
    let month = places_downloader::quota::current_month();
    std::fs::write(
        dir.path().join("usage.dat"),
        format!("NEARBY=3\nREVIEWS=21\nPHOTOS=9\nLASTDATE={month}"),
    )
    .unwrap();

    let output = cli(dir.path()).args(["usage", "--json"]).output().unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["nearby_search_calls"], 3);
    assert_eq!(value["place_details_calls"], 21);
    assert_eq!(value["place_photo_calls"], 9);
}

#[test]
fn test_usage_with_corrupt_ledger_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("usage.dat"), "NEARBY=three\nLASTDATE=1").unwrap();

    let output = cli(dir.path()).arg("usage").output().unwrap();

    assert!(!output.status.success());
}
