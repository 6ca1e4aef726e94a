//! E2E tests for the write commands against the local backend.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn bb_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bb"));
    cmd.current_dir(dir);
    cmd.env("BEADBOARD_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".xdg"));
    cmd.env_remove("BEADBOARD_BACKEND");
    cmd.env_remove("FORMAT");
    cmd
}

fn local_project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    bb_cmd(dir.path())
        .args(["--backend", "local", "init"])
        .assert()
        .success();
    dir
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = bb_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("bb should not crash");
    assert!(
        output.status.success(),
        "bb {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn create(dir: &Path, args: &[&str]) -> String {
    let mut full = vec!["create"];
    full.extend_from_slice(args);
    let json = run_json(dir, &full);
    json["id"].as_str().expect("id must exist").to_string()
}

fn ready_ids(dir: &Path) -> Vec<String> {
    run_json(dir, &["ready"])
        .as_array()
        .expect("array")
        .iter()
        .map(|i| i["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn create_applies_defaults_and_flags() {
    let dir = local_project();
    let json = run_json(dir.path(), &["create", "Plain task"]);
    assert!(json["id"].as_str().unwrap().starts_with("bd-"));
    assert_eq!(json["status"], "open");
    assert_eq!(json["type"], "task");
    assert_eq!(json["priority"], 2);

    let json = run_json(
        dir.path(),
        &[
            "create", "Crash on save", "-t", "bug", "-p", "0", "-a", "agent", "-l", "ui,crash",
        ],
    );
    assert_eq!(json["type"], "bug");
    assert_eq!(json["priority"], 0);
    assert_eq!(json["assignee"], "agent");
    assert_eq!(json["labels"], serde_json::json!(["ui", "crash"]));
}

#[test]
fn create_rejects_blank_title() {
    let dir = local_project();
    bb_cmd(dir.path())
        .args(["create", "   ", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2002]"));
}

#[test]
fn closing_a_blocker_releases_dependents() {
    let dir = local_project();
    let schema = create(dir.path(), &["Design schema", "-p", "1"]);
    let api = create(dir.path(), &["Build API", "--blocked-by", &schema]);

    assert_eq!(ready_ids(dir.path()), vec![schema.clone()]);

    run_json(dir.path(), &["update", &schema, "--status", "in_progress"]);
    assert!(ready_ids(dir.path()).is_empty());

    let closed = run_json(dir.path(), &["close", &schema]);
    assert_eq!(closed[0]["status"], "closed");
    assert!(closed[0]["closedAt"].is_number());
    assert_eq!(ready_ids(dir.path()), vec![api]);
}

#[test]
fn dep_add_and_rm_round_trip() {
    let dir = local_project();
    let a = create(dir.path(), &["A"]);
    let b = create(dir.path(), &["B"]);

    let added = run_json(dir.path(), &["dep", "add", &b, "--blocks", &a]);
    assert_eq!(added["type"], "blocks");
    assert!(added.get("cycle").is_none());
    assert_eq!(ready_ids(dir.path()), vec![a.clone()]);

    let removed = run_json(dir.path(), &["dep", "rm", &b, &a]);
    assert_eq!(removed["removed"], true);
    assert_eq!(ready_ids(dir.path()).len(), 2);
}

#[test]
fn cycles_are_warned_not_rejected() {
    let dir = local_project();
    let a = create(dir.path(), &["A"]);
    let b = create(dir.path(), &["B", "--blocked-by", &a]);

    let added = run_json(dir.path(), &["dep", "add", &a, "--blocks", &b]);
    assert_eq!(added["cycle"]["cyclePath"].as_array().unwrap().len(), 3);

    let board = run_json(dir.path(), &["board"]);
    assert_eq!(board["blocked"].as_array().unwrap().len(), 2);
    assert_eq!(board["cycles"].as_array().unwrap().len(), 1);

    bb_cmd(dir.path())
        .args(["board", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings"));
}

#[test]
fn parent_links_feed_epic_view() {
    let dir = local_project();
    let epic = create(dir.path(), &["Realtime", "-t", "epic"]);
    let child = create(dir.path(), &["Socket server", "--parent", &epic]);
    create(dir.path(), &["Loose end"]);

    run_json(dir.path(), &["close", &child]);
    let epics = run_json(dir.path(), &["epics"]);
    assert_eq!(epics["groups"][0]["epic"]["id"], epic.as_str());
    assert_eq!(epics["groups"][0]["progress"]["done"], 1);
    assert_eq!(epics["groups"][0]["progress"]["total"], 1);
    assert_eq!(epics["unassigned"].as_array().unwrap().len(), 1);

    let shown = run_json(dir.path(), &["show", &epic]);
    assert_eq!(shown["children"][0]["id"], child.as_str());
    assert_eq!(shown["progress"], "1/1 (100%)");
}

#[test]
fn update_edits_fields() {
    let dir = local_project();
    let id = create(dir.path(), &["Draft", "-l", "old"]);
    let updated = run_json(
        dir.path(),
        &[
            "update", &id, "--title", "Final", "-p", "P1", "--labels", "new", "-a", "agent",
        ],
    );
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["priority"], 1);
    assert_eq!(updated["labels"], serde_json::json!(["new"]));
    assert_eq!(updated["assignee"], "agent");

    bb_cmd(dir.path())
        .args(["update", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to update"));
}

#[test]
fn delete_leaves_dependents_ready() {
    let dir = local_project();
    let blocker = create(dir.path(), &["Blocker"]);
    let dependent = create(dir.path(), &["Dependent", "--blocked-by", &blocker]);

    let deleted = run_json(dir.path(), &["delete", &blocker]);
    assert_eq!(deleted["ok"], true);
    assert_eq!(ready_ids(dir.path()), vec![dependent]);

    bb_cmd(dir.path())
        .args(["delete", &blocker, "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn filters_reject_unknown_values() {
    let dir = local_project();
    bb_cmd(dir.path())
        .args(["list", "--status", "doing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status"))
        .stderr(predicate::str::contains("code: E2003"));
}

#[test]
fn malformed_config_reports_parse_error_code() {
    let dir = local_project();
    std::fs::write(dir.path().join(".beadboard/config.toml"), "[backend\nkind = ")
        .expect("write config");
    bb_cmd(dir.path())
        .args(["list", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error_code\": \"E1002\""));
}
