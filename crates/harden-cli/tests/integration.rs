#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn harden(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("harden").unwrap();
    cmd.current_dir(dir.path())
        .env("HARDEN_CONFIG", dir.path().join("harden.yaml"));
    cmd
}

// ---------------------------------------------------------------------------
// role selection
// ---------------------------------------------------------------------------

#[test]
fn apply_without_role_is_usage_error() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["apply", "--log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--member-server"));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "no log file should be written");
}

#[test]
fn catalog_without_role_fails() {
    let dir = TempDir::new().unwrap();
    harden(&dir).arg("catalog").assert().failure();
}

#[test]
fn catalog_member_server_includes_every_list() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["catalog", "--member-server"])
        .assert()
        .success()
        .stdout(predicate::str::contains("XblGameSave"))
        .stdout(predicate::str::contains("Spooler"))
        .stdout(predicate::str::contains("Browser"));
}

#[test]
fn catalog_domain_controller_keeps_browser() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["catalog", "--domain-controller"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spooler"))
        .stdout(predicate::str::contains("Browser").not());
}

#[test]
fn catalog_print_server_keeps_spooler() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["catalog", "--print-server"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spooler").not());
}

#[test]
fn catalog_json_is_ordered_directive_list() {
    let dir = TempDir::new().unwrap();
    let out = harden(&dir)
        .args(["--json", "catalog", "--domain-controller"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let list = value.as_array().unwrap();
    assert_eq!(list[0]["service_id"], "AxInstSV");
    assert_eq!(list.last().unwrap()["service_id"], "PrintNotify");
    assert_eq!(list.last().unwrap()["target"], "Disabled");
}

#[test]
fn catalog_honours_config_exclusions() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("harden.yaml"),
        "exclude:\n  - Audiosrv\nextra:\n  - service: Fax\n    mode: Disabled\n",
    )
    .unwrap();
    harden(&dir)
        .args(["catalog", "--print-server"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Audiosrv").not())
        .stdout(predicate::str::contains("Fax"));
}

// ---------------------------------------------------------------------------
// undo
// ---------------------------------------------------------------------------

#[test]
fn undo_requires_log_path() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .arg("undo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--undo-log-file"));
}

#[test]
fn undo_with_missing_log_reports_not_found() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["undo", "--undo-log-file", "missing.log", "--log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undo log not found"));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "undo must not write a log when it aborts");
}

// ---------------------------------------------------------------------------
// log show
// ---------------------------------------------------------------------------

#[test]
fn log_show_lists_records_and_bad_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.log");
    std::fs::write(
        &path,
        "DateString,ServiceName,StartTypeBeforeChange,StartTypeAfterChange,SchemaVersion\n\
         2024-01-01T00:00:00Z,Spooler,Automatic,Disabled,2\n\
         2024-01-01T00:00:01Z,bthserv,Maybe,Disabled,2\n",
    )
    .unwrap();

    harden(&dir)
        .args(["log", "show"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Spooler"))
        .stdout(predicate::str::contains("line 3"));
}

#[test]
fn log_show_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.log");
    std::fs::write(&path, "2024-01-01T00:00:00Z,Spooler,Automatic,Disabled\n").unwrap();

    let out = harden(&dir)
        .args(["--json", "log", "show"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["records"][0]["before"], "Automatic");
    assert_eq!(value["records"][0]["schema_version"], 1);
}

#[test]
fn log_show_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["log", "show", "nope.log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undo log not found"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_without_file_is_ok() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config OK"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("harden.yaml"), "exclude:\n  - \"\"\n").unwrap();
    harden(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("empty service name"));
}

#[test]
fn config_show_uses_defaults_when_missing() {
    let dir = TempDir::new().unwrap();
    harden(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("harden.yaml"), "exclude: [unterminated\n").unwrap();
    harden(&dir)
        .args(["catalog", "--member-server"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}
