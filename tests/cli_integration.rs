//! Integration tests for the `td` CLI.
//!
//! Each test works in a temp directory, runs `td` as a subprocess, and
//! verifies stdout and/or file contents.

use std::fs;
use std::path::Path;
use std::process::Command;

const SAMPLE_DATA: &str = r##"{
  "version": "1",
  "tasks": [
    {"id": "t1", "title": "Write report", "projectId": "p1", "sectionId": "default",
     "completed": false, "priority": 2, "labels": ["l1"], "createdAt": "2025-05-01T09:00:00Z"},
    {"id": "t2", "title": "Inbox item", "completed": false, "priority": 4, "labels": [],
     "createdAt": "2025-05-02T09:00:00Z"}
  ],
  "projects": [
    {"id": "p1", "name": "Quarterly Review", "slug": "quarterly-review", "color": "#ff0000",
     "sections": [{"id": "default", "name": "Default", "color": "#6b7280", "items": ["t1"]}]},
    {"id": "p2", "name": "Garden", "slug": "garden", "color": "#00ff00", "sections": []}
  ],
  "labels": [
    {"id": "l1", "name": "urgent", "slug": "urgent", "color": "#ff8800"}
  ],
  "projectGroups": {
    "id": "projects-root", "name": "Projects", "slug": "projects-root", "color": "#6b7280", "type": "project",
    "items": [
      {"id": "g1", "name": "Work", "slug": "work", "color": "#0000ff", "type": "project", "items": ["p1"]},
      "p2"
    ]
  },
  "labelGroups": {
    "id": "labels-root", "name": "Labels", "slug": "labels-root", "color": "#6b7280", "type": "label",
    "items": ["l1"]
  }
}
"##;

fn write_sample(dir: &Path) {
    fs::write(dir.join("taskdeck.json"), SAMPLE_DATA).unwrap();
}

/// Run `td` in `dir`, isolated from the caller's environment.
fn run_td(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_td"))
        .args(args)
        .current_dir(dir)
        .env_remove("TASKDECK_CONFIG")
        .env_remove("TASKDECK_DATA")
        .env_remove("TASKDECK_BIND")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run td");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `td` expecting success, return stdout.
fn run_td_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_td(dir, args);
    if !success {
        panic!("td {:?} failed:\nstdout: {}\nstderr: {}", args, stdout, stderr);
    }
    stdout
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_data_and_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_td_ok(tmp.path(), &["init"]);
    assert!(out.contains("taskdeck.json"));
    assert!(out.contains("taskdeck.toml"));

    let data: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("taskdeck.json")).unwrap()).unwrap();
    assert_eq!(data["version"], "1");
    assert_eq!(data["projectGroups"]["id"], "projects-root");
    assert_eq!(data["labelGroups"]["type"], "label");

    let config = fs::read_to_string(tmp.path().join("taskdeck.toml")).unwrap();
    assert!(config.contains("bind = \"127.0.0.1:4680\""));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_sample(tmp.path());

    let (_, stderr, success) = run_td(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));
    // Untouched
    assert_eq!(fs::read_to_string(tmp.path().join("taskdeck.json")).unwrap(), SAMPLE_DATA);

    run_td_ok(tmp.path(), &["init", "--force"]);
    let data = fs::read_to_string(tmp.path().join("taskdeck.json")).unwrap();
    assert!(!data.contains("Quarterly Review"));
}

#[test]
fn test_data_flag_overrides_path() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_td_ok(tmp.path(), &["--data", "nested/dir/tasks.json", "init"]);
    assert!(tmp.path().join("nested/dir/tasks.json").exists());
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn test_check_valid_sample() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_sample(tmp.path());
    let out = run_td_ok(tmp.path(), &["check"]);
    assert!(out.contains("✓ data file is valid"));
}

#[test]
fn test_check_reports_problems_as_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let broken = SAMPLE_DATA
        .replace(r#""projectId": "p1""#, r#""projectId": "nope""#)
        .replace(r#""items": ["p1"]"#, r#""items": ["p9"]"#);
    fs::write(tmp.path().join("taskdeck.json"), broken).unwrap();

    let out = run_td_ok(tmp.path(), &["check", "--json"]);
    let result: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(result["valid"], false);
    let errors = result["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["type"] == "unknown_project" && e["task_id"] == "t1"));
    let warnings = result["warnings"].as_array().unwrap();
    assert!(warnings.iter().any(|w| w["type"] == "dangling_leaf" && w["item_id"] == "p9"));
}

#[test]
fn test_check_missing_data_file_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_td(tmp.path(), &["check"]);
    assert!(!success);
    assert!(stderr.contains("error: could not read"));
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

#[test]
fn test_tree_outline() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_sample(tmp.path());
    let out = run_td_ok(tmp.path(), &["tree", "--type", "project"]);
    assert_eq!(out, "Projects/\n  Work/\n    Quarterly Review\n  Garden\n");

    let out = run_td_ok(tmp.path(), &["tree"]);
    assert!(out.contains("Labels/\n  urgent\n"));
}

#[test]
fn test_tree_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_sample(tmp.path());
    let out = run_td_ok(tmp.path(), &["tree", "--type", "label", "--json"]);
    let trees: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(trees[0]["id"], "labels-root");
    assert_eq!(trees[0]["items"][0], "l1");
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_and_show() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(
        tmp.path().join("taskdeck.toml"),
        "# keep me\n[server]\nbind = \"127.0.0.1:4680\"\n",
    )
    .unwrap();

    run_td_ok(tmp.path(), &["config", "set", "server.bind", "0.0.0.0:9999"]);
    run_td_ok(tmp.path(), &["config", "set", "log.json", "true"]);
    let text = fs::read_to_string(tmp.path().join("taskdeck.toml")).unwrap();
    assert!(text.starts_with("# keep me\n"));

    let out = run_td_ok(tmp.path(), &["config", "show", "--json"]);
    let config: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(config["server"]["bind"], "0.0.0.0:9999");
    assert_eq!(config["log"]["json"], true);
    assert_eq!(config["data"]["path"], "taskdeck.json");
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_td(tmp.path(), &["config", "set", "server.port", "80"]);
    assert!(!success);
    assert!(stderr.contains("unknown config key"));
    assert!(!tmp.path().join("taskdeck.toml").exists());
}
