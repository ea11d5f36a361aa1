use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// A 200 x 50 x 10 box, far larger than the 4-unit showcase slot.
fn write_box_obj() -> NamedTempFile {
    let obj = "\
v 0 0 0
v 200 0 0
v 200 50 0
v 0 50 0
v 0 0 10
v 200 0 10
v 200 50 10
v 0 50 10
f 1 2 3 4
f 5 8 7 6
f 1 5 6 2
f 2 6 7 3
f 3 7 8 4
f 4 8 5 1
";
    let mut tmp = NamedTempFile::new().expect("temp obj");
    tmp.write_all(obj.as_bytes()).expect("write obj");
    tmp
}

#[test]
fn summary_reports_mesh_schedule_and_phases() {
    let model = write_box_obj();
    let mut cmd = Command::cargo_bin("electras-site").expect("binary exists");
    cmd.arg(model.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("8 vertices, 12 triangles"))
        .stdout(contains("scale=0.0200"))
        .stdout(contains(" - 250ms bars-open"))
        .stdout(contains(" - 5300ms model-visible"))
        .stdout(contains(" - p=1.00 rotation=12.566 mask=1.000 text=white"));
}

#[test]
fn missing_model_fails() {
    let mut cmd = Command::cargo_bin("electras-site").expect("binary exists");
    cmd.arg("does-not-exist.obj").arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to read does-not-exist.obj"));
}

#[test]
fn rejects_unknown_flags() {
    let model = write_box_obj();
    let mut cmd = Command::cargo_bin("electras-site").expect("binary exists");
    cmd.arg(model.path()).arg("--run-scripts");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --run-scripts"));
}
