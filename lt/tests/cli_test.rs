//! End-to-end tests for the `lt` binary against a files backend

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REPORTS: &str = r#"[
  {"id": 100, "title": "Loader campaign", "creation_date": "2024-06-01", "description": "First report"},
  {"id": 200, "title": "Credential theft", "creation_date": "2024-06-02", "description": "Second report"}
]"#;

const USERS: &str = "\
- user_id: 1
  name: Ana
  job_title: SOC analyst
  sectors: energy; finance
- user_id: 2
  name: Bo
  job_title: CISO
";

struct Workspace {
    temp: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(skip_offset: usize) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let data = temp.path().join("data");
        let config = temp.path().join("labeltool.yml");
        fs::write(
            &config,
            format!(
                "storage:\n  backend: files\n  path: {}\ntutorial:\n  skip-offset: {}\n",
                data.display(),
                skip_offset
            ),
        )
        .expect("Failed to write config");
        fs::write(temp.path().join("reports.json"), REPORTS).expect("Failed to write reports");
        fs::write(temp.path().join("users.yaml"), USERS).expect("Failed to write users");
        Self { temp, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn lt(&self) -> Command {
        let mut cmd = Command::cargo_bin("lt").expect("binary exists");
        cmd.env("LABELTOOL_LOG_DIR", self.path("logs"))
            .env("NO_COLOR", "1")
            .env("CLICOLOR", "0")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn provision(&self) {
        self.lt()
            .arg("import")
            .arg("--reports")
            .arg(self.path("reports.json"))
            .arg("--users")
            .arg(self.path("users.yaml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 2 reports and 2 users"));
        self.lt().arg("init").assert().success();
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).expect("file exists")).expect("valid json")
}

#[test]
fn test_missing_state_row_is_fatal() {
    let ws = Workspace::new(0);
    ws.lt()
        .arg("import")
        .arg("--reports")
        .arg(ws.path("reports.json"))
        .arg("--users")
        .arg(ws.path("users.yaml"))
        .assert()
        .success();

    ws.lt()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("State record 1 not found"));
}

#[test]
fn test_missing_catalog_is_fatal() {
    let ws = Workspace::new(0);
    ws.lt().arg("init").assert().success();
    ws.lt()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Catalog data missing"));
}

#[test]
fn test_full_walk() {
    let ws = Workspace::new(0);
    ws.provision();

    ws.lt()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome"));

    ws.lt()
        .arg("mark")
        .arg("r")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do in phase tutorial"));

    ws.lt()
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report 1 of 2 | User 1 of 2"))
        .stdout(predicate::str::contains("Loader campaign"));

    ws.lt()
        .arg("mark")
        .arg("relevant")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report 1 of 2 | User 2 of 2"))
        .stdout(predicate::str::contains("CISO"));

    ws.lt()
        .arg("mark")
        .arg("n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report 2 of 2 | User 1 of 2"))
        .stdout(predicate::str::contains("Sectors: energy, finance"));

    let state = read_json(&ws.path("data/state.json"));
    assert_eq!(state[0]["report_id"], 1);
    assert_eq!(state[0]["user_id"], 0);
    assert_eq!(state[0]["show_tutorial"], false);

    ws.lt().arg("mark").arg("n").assert().success();
    ws.lt()
        .arg("mark")
        .arg("r")
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 reports have been annotated"));

    ws.lt()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Phase: complete"))
        .stdout(predicate::str::contains("Relevant judgments: 2"));

    let output = ws.path("results.json");
    ws.lt().arg("export").arg("--output").arg(&output).assert().success();
    let exported = read_json(&output);
    assert_eq!(exported["1"]["relevant_reports"], serde_json::json!([100]));
    assert_eq!(exported["2"]["relevant_reports"], serde_json::json!([200]));
}

#[test]
fn test_failed_save_warns_and_keeps_cursor() {
    let ws = Workspace::new(0);
    ws.provision();
    ws.lt().arg("start").assert().success();

    let state_before = fs::read_to_string(ws.path("data/state.json")).expect("state exists");
    fs::create_dir(ws.path("data/state.json.tmp")).expect("Failed to block state writes");

    ws.lt()
        .arg("mark")
        .arg("r")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Warning: Could not save progress"));

    let state_after = fs::read_to_string(ws.path("data/state.json")).expect("state exists");
    assert_eq!(state_before, state_after);
    let annotations = read_json(&ws.path("data/annotations.json"));
    assert_eq!(annotations[0]["data"]["1"]["relevant_reports"], serde_json::json!([100]));

    fs::remove_dir(ws.path("data/state.json.tmp")).expect("Failed to unblock state writes");
    ws.lt()
        .arg("mark")
        .arg("r")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report 1 of 2 | User 2 of 2"));
    let annotations = read_json(&ws.path("data/annotations.json"));
    assert_eq!(annotations[0]["data"]["1"]["relevant_reports"], serde_json::json!([100]));
}

#[test]
fn test_tutorial_skip_past_catalog_completes() {
    let ws = Workspace::new(10);
    ws.provision();
    ws.lt()
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("have been annotated"));
}

#[test]
fn test_init_keeps_existing_rows_unless_reset() {
    let ws = Workspace::new(0);
    ws.provision();
    ws.lt().arg("start").assert().success();

    ws.lt()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(read_json(&ws.path("data/state.json"))[0]["show_tutorial"], false);

    ws.lt().arg("init").arg("--reset").assert().success();
    assert_eq!(read_json(&ws.path("data/state.json"))[0]["show_tutorial"], true);
}
