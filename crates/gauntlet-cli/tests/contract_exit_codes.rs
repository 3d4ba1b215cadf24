//! Exit-code contract: 0 = all cases passed, 1 = eval failure or
//! regression, 2 = configuration problem. CI pipelines gate on these.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn gauntlet(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gauntlet").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

/// `init` then `validate` on the scaffold must succeed.
#[test]
fn init_scaffold_validates_cleanly() {
    let dir = TempDir::new().unwrap();

    gauntlet(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created prompts/"));

    assert!(dir.path().join("gauntlet.yaml").exists());
    assert!(dir.path().join("prompts/default.yaml").exists());
    assert!(dir.path().join("suites/example.yaml").exists());

    gauntlet(&dir)
        .args(["validate", "--suite", "suites/example.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    gauntlet(&dir).arg("init").assert().success();
    gauntlet(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}

/// The fake provider answers "ok", which fails the scaffold's contains
/// judge, so the run exits 1 but still writes results.
#[test]
fn failing_run_exits_one_and_saves_results() {
    let dir = TempDir::new().unwrap();
    gauntlet(&dir).arg("init").assert().success();

    gauntlet(&dir)
        .args([
            "run",
            "--suite",
            "suites/example.yaml",
            "--provider",
            "fake",
            "--output",
            "out.json",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL"));

    let saved = fs::read_to_string(dir.path().join("out.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(parsed["suite_name"], "example");
    assert_eq!(parsed["stats"]["failed_cases"], 1);
}

#[test]
fn diff_of_identical_runs_exits_zero() {
    let dir = TempDir::new().unwrap();
    gauntlet(&dir).arg("init").assert().success();

    for out in ["a.json", "b.json"] {
        gauntlet(&dir)
            .args([
                "run",
                "--suite",
                "suites/example.yaml",
                "--provider",
                "fake",
                "--output",
                out,
            ])
            .assert()
            .code(1);
    }

    gauntlet(&dir)
        .args(["diff", "a.json", "b.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 regressed"));
}

#[test]
fn missing_suite_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    gauntlet(&dir)
        .args(["run", "--suite", "nope.yaml", "--provider", "fake"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fatal"));
}

#[test]
fn invalid_suite_fails_validation() {
    let dir = TempDir::new().unwrap();
    gauntlet(&dir).arg("init").assert().success();
    fs::write(dir.path().join("suites/broken.yaml"), "name: broken\ncases: []\n").unwrap();

    gauntlet(&dir)
        .args(["validate", "--suite", "suites/broken.yaml"])
        .assert()
        .code(2);
}

#[test]
fn list_shows_scaffolded_suite() {
    let dir = TempDir::new().unwrap();
    gauntlet(&dir).arg("init").assert().success();

    gauntlet(&dir)
        .args(["list", "suites"])
        .assert()
        .success()
        .stdout(predicate::str::contains("example"));
}
