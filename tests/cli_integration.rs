//! CLI integration tests for opsgraph
//!
//! These tests run the binary against snapshot files and verify the
//! commands end to end, including config discovery.

use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get a command instance for the opsgraph binary
fn opsgraph_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("opsgraph"))
}

const CHAIN: &str = r#"[
    {"id": "A", "title": "Define MVP", "category": "product", "status": "completed"},
    {"id": "B", "title": "Build API", "category": "tech", "status": "in_progress", "dependencies": ["A"]},
    {"id": "C", "title": "Launch campaign", "category": "marketing", "dependencies": ["A", "B"]}
]"#;

/// Write a snapshot into a fresh temp dir
fn setup_snapshot(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn run_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = opsgraph_cmd()
        .current_dir(dir.path())
        .args(args)
        .args(["--format", "json"])
        .assert()
        .success();
    serde_json::from_slice(&output.get_output().stdout).unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_config() {
    let dir = TempDir::new().unwrap();

    opsgraph_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized opsgraph config"));

    assert!(dir.path().join(".opsgraph/config.toml").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    opsgraph_cmd().arg("init").arg(dir.path()).assert().success();
    opsgraph_cmd().arg("init").arg(dir.path()).assert().success();
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_layout_text_lists_levels_and_edges() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["layout", path.to_str().unwrap(), "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 task(s), 3 edge(s), 3 level(s)"))
        .stdout(predicate::str::contains("Level 2:"))
        .stdout(predicate::str::contains("A -> B (in progress)"))
        .stdout(predicate::str::contains("B -> C"));
}

#[test]
fn test_layout_json_contract() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    let json = run_json(&dir, &["layout", path.to_str().unwrap()]);

    let nodes = json["nodes"].as_array().unwrap();
    let edges = json["edges"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(edges.len(), 3);

    assert_eq!(nodes[2]["id"], "C");
    assert_eq!(nodes[2]["level"], 2);
    assert_eq!(nodes[2]["y"], 300.0);
    assert_eq!(nodes[2]["task"]["title"], "Launch campaign");

    assert_eq!(edges[0]["fromId"], "A");
    assert_eq!(edges[0]["toId"], "B");
    assert_eq!(edges[0]["animated"], true);
}

#[test]
fn test_layout_reads_stdin() {
    let dir = TempDir::new().unwrap();

    let output = opsgraph_cmd()
        .current_dir(dir.path())
        .args(["layout", "-", "--format", "json"])
        .write_stdin(r#"{"tasks": [{"id": 1}, {"id": 2, "dependencies": [1, 99]}]}"#)
        .assert()
        .success();

    let json: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
    // dangling 99 produces no edge
    assert_eq!(json["edges"].as_array().unwrap().len(), 1);
}

#[test]
fn test_layout_handles_cycles() {
    let (dir, path) = setup_snapshot(
        "tasks.json",
        r#"[{"id": "A", "dependencies": ["B"]}, {"id": "B", "dependencies": ["A"]}]"#,
    );

    let json = run_json(&dir, &["layout", path.to_str().unwrap()]);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(json["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn test_layout_empty_snapshot() {
    let (dir, path) = setup_snapshot("tasks.json", "[]");

    let json = run_json(&dir, &["layout", path.to_str().unwrap()]);
    assert_eq!(json, serde_json::json!({ "nodes": [], "edges": [] }));
}

#[test]
fn test_layout_fingerprint_is_stable() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    let first = run_json(&dir, &["layout", path.to_str().unwrap(), "--fingerprint"]);
    let second = run_json(&dir, &["layout", path.to_str().unwrap(), "--fingerprint"]);

    assert_eq!(first["fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(first, second);
}

#[test]
fn test_layout_reads_jsonl() {
    let (dir, path) = setup_snapshot(
        "tasks.jsonl",
        "{\"id\": \"a\"}\n\n{\"id\": \"b\", \"dependencies\": [\"a\"]}\n",
    );

    let json = run_json(&dir, &["layout", path.to_str().unwrap()]);
    assert_eq!(json["nodes"][1]["level"], 1);
}

#[test]
fn test_layout_uses_project_config() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);
    opsgraph_cmd().arg("init").arg(dir.path()).assert().success();
    fs::write(
        dir.path().join(".opsgraph/config.toml"),
        "[layout]\nrow_spacing = 100.0\ncolumn_spacing = 80.0\n",
    )
    .unwrap();

    let json = run_json(&dir, &["layout", path.to_str().unwrap()]);
    assert_eq!(json["nodes"][2]["y"], 200.0);
}

#[test]
fn test_invalid_config_fails() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);
    fs::create_dir_all(dir.path().join(".opsgraph")).unwrap();
    fs::write(
        dir.path().join(".opsgraph/config.toml"),
        "[layout]\ncolumn_spacing = -5.0\n",
    )
    .unwrap();

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["layout", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_init_ignores_broken_config() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".opsgraph")).unwrap();
    fs::write(dir.path().join(".opsgraph/config.toml"), "[layout
").unwrap();

    opsgraph_cmd()
        .current_dir(dir.path())
        .arg("init")
        .arg(dir.path())
        .assert()
        .success();

    // The existing file is left for the user to fix
    let content = fs::read_to_string(dir.path().join(".opsgraph/config.toml")).unwrap();
    assert_eq!(content, "[layout\n");
}

#[test]
fn test_missing_snapshot_fails() {
    let dir = TempDir::new().unwrap();

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["layout", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open snapshot"));
}

#[test]
fn test_malformed_snapshot_fails() {
    let (dir, path) = setup_snapshot("tasks.json", r#"{"items": []}"#);

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["layout", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse snapshot"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["--verbose", "layout", path.to_str().unwrap(), "--fingerprint"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:layout] Loaded 3 task record(s)"));
}

// =============================================================================
// Level and Query Tests
// =============================================================================

#[test]
fn test_levels() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    let json = run_json(&dir, &["levels", path.to_str().unwrap()]);
    let levels: Vec<(String, u64)> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["id"].as_str().unwrap().to_string(),
                item["level"].as_u64().unwrap(),
            )
        })
        .collect();

    assert_eq!(
        levels,
        vec![("A".to_string(), 0), ("B".to_string(), 1), ("C".to_string(), 2)]
    );
}

#[test]
fn test_ready_and_blocked() {
    let (dir, path) = setup_snapshot(
        "tasks.json",
        r#"[
            {"id": "A", "status": "completed"},
            {"id": "B", "dependencies": ["A"]},
            {"id": "C", "dependencies": ["B"]}
        ]"#,
    );

    let ready = run_json(&dir, &["ready", path.to_str().unwrap()]);
    assert_eq!(ready.as_array().unwrap().len(), 1);
    assert_eq!(ready[0]["id"], "B");

    let blocked = run_json(&dir, &["blocked", path.to_str().unwrap()]);
    assert_eq!(blocked.as_array().unwrap().len(), 1);
    assert_eq!(blocked[0]["task_id"], "C");
    assert_eq!(blocked[0]["blocked_by"][0], "B");
}

#[test]
fn test_blocked_text_when_nothing_blocked() {
    let (dir, path) = setup_snapshot("tasks.json", r#"[{"id": "A"}]"#);

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["blocked", path.to_str().unwrap(), "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No blocked tasks."));
}

#[test]
fn test_status() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    let json = run_json(&dir, &["status", path.to_str().unwrap()]);
    assert_eq!(json["total_tasks"], 3);
    assert_eq!(json["completed_tasks"], 1);
    assert_eq!(json["in_progress_tasks"], 1);
    assert_eq!(json["dependency_blocked_tasks"], 1);
    assert_eq!(json["levels"], 3);
    assert_eq!(json["cycles"], 0);
    assert!(json["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_check_clean_snapshot() {
    let (dir, path) = setup_snapshot("tasks.json", CHAIN);

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["check", path.to_str().unwrap(), "--strict", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found in 3 task(s)."));
}

#[test]
fn test_check_reports_issues() {
    let (dir, path) = setup_snapshot(
        "tasks.json",
        r#"[
            {"id": "A"},
            {"id": "B", "dependencies": ["C"]},
            {"id": "C", "dependencies": ["B"]},
            {"id": "A", "dependencies": ["ghost"]}
        ]"#,
    );

    let json = run_json(&dir, &["check", path.to_str().unwrap()]);
    assert_eq!(json["ok"], false);
    assert_eq!(json["dangling"][0]["missing"], "ghost");
    assert_eq!(json["duplicates"][0], "A");
    assert_eq!(json["cycles"][0], serde_json::json!(["B", "C"]));

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["check", path.to_str().unwrap(), "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Snapshot has 3 issue(s)"));
}

#[test]
fn test_watch_rejects_stdin() {
    let dir = TempDir::new().unwrap();

    opsgraph_cmd()
        .current_dir(dir.path())
        .args(["watch", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stdin cannot be watched"));
}
