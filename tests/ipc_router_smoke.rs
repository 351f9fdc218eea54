mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{register, request, request_ok, select_workspace, spawn_sidecar};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", None, json!({}));
    assert!(health["workspacePath"].is_null());
    assert_eq!(health["attendanceDay"], "Sunday");

    let workspace = select_workspace(&mut stdin, &mut reader, "classbook-router-smoke");
    assert!(workspace.join("classbook.sqlite3").is_file());
    let token = register(&mut stdin, &mut reader, "smoke@example.org");
    let t = Some(token.as_str());

    for (id, method) in [
        ("2", "profile.get"),
        ("3", "students.list"),
        ("4", "classes.list"),
        ("5", "missions.list"),
        ("6", "attendance.summary"),
        ("7", "missions.seedDefaults"),
    ] {
        let resp = request(&mut stdin, &mut reader, id, method, t, json!({}));
        assert_eq!(resp["ok"], true, "{} failed: {}", method, resp);
    }

    // Families that need params answer with bad_params, never not_implemented.
    for (id, method) in [
        ("8", "students.get"),
        ("9", "classes.get"),
        ("10", "missions.get"),
        ("11", "completions.create"),
        ("12", "completions.update"),
        ("13", "completions.bulk"),
        ("14", "completions.studentDay"),
        ("15", "talents.get"),
        ("16", "attendance.listByDate"),
        ("17", "attendance.upsertBatch"),
    ] {
        let resp = request(&mut stdin, &mut reader, id, method, t, json!({}));
        assert_eq!(resp["error"]["code"], "bad_params", "{}: {}", method, resp);
    }

    let resp = request(&mut stdin, &mut reader, "18", "reports.export", t, json!({}));
    assert_eq!(resp["error"]["code"], "not_implemented");

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let v: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(v["error"]["code"], "bad_json");

    let _ = request_ok(&mut stdin, &mut reader, "19", "health", None, json!({}));
}

#[test]
fn workspace_can_be_opened_from_the_command_line() {
    let workspace = test_support::temp_dir("classbook-cli-workspace");
    let (_child, mut stdin, mut reader) = test_support::spawn_sidecar_with(&[
        "--workspace",
        workspace.to_str().expect("utf8 path"),
    ]);
    let health = request_ok(&mut stdin, &mut reader, "1", "health", None, json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(workspace.to_string_lossy().as_ref())
    );
    let _ = register(&mut stdin, &mut reader, "cli@example.org");
}
