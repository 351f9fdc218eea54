mod test_support;

use serde_json::json;
use test_support::{
    create_student, register, request_err, request_ok, select_workspace, spawn_sidecar, str_field,
};

#[test]
fn bulk_overwrites_and_applies_one_ledger_entry_per_batch() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "classbook-bulk");
    let token = register(&mut stdin, &mut reader, "bulk@example.org");
    let t = Some(token.as_str());
    let student_id = create_student(&mut stdin, &mut reader, &token, "Mina");

    let missions = request_ok(&mut stdin, &mut reader, "1", "missions.list", t, json!({}));
    let ids: Vec<(String, String)> = missions["missions"]
        .as_array()
        .expect("missions")
        .iter()
        .map(|m| (str_field(m, "name"), str_field(m, "id")))
        .collect();
    let id_of = |name: &str| {
        ids.iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.clone())
            .expect("mission")
    };

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "completions.bulk",
        t,
        json!({
            "studentId": student_id,
            "completionDate": "2025-03-16",
            "completions": [
                { "missionId": id_of("Evangelism"), "result": { "completed": true, "value": 2 } },
                { "missionId": id_of("Bible reading"), "result": { "completed": true, "value": 0 } }
            ]
        }),
    );
    assert_eq!(first["talentDelta"].as_i64(), Some(5));
    assert_eq!(first["completions"].as_array().map(|a| a.len()), Some(2));

    // Same day again: rows are overwritten, not rejected.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "completions.bulk",
        t,
        json!({
            "studentId": student_id,
            "completionDate": "2025-03-16",
            "completions": [
                { "missionId": id_of("Evangelism"), "result": { "completed": false } },
                { "missionId": id_of("Bible reading"), "result": { "completed": true, "value": 4 } },
                { "missionId": id_of("Choir"), "result": { "completed": true } }
            ]
        }),
    );
    assert_eq!(second["talentDelta"].as_i64(), Some(-5 + 1 + 1));

    let talents = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "talents.get",
        t,
        json!({ "studentId": student_id }),
    );
    assert_eq!(talents["totalTalents"].as_i64(), Some(2));
    assert_eq!(talents["earnedTalents"].as_i64(), Some(5));
    assert_eq!(talents["spentTalents"].as_i64(), Some(3));
    let history = talents["history"].as_array().expect("history");
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|h| h["source"] == "other"));

    let day = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "completions.studentDay",
        t,
        json!({ "studentId": student_id, "date": "2025-03-16" }),
    );
    let earned: i64 = day["missions"]
        .as_array()
        .expect("missions")
        .iter()
        .filter_map(|r| r["talentEarned"].as_i64())
        .sum();
    assert_eq!(earned, 2);
}

#[test]
fn failing_item_aborts_the_whole_batch() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "classbook-bulk-abort");
    let token = register(&mut stdin, &mut reader, "abort@example.org");
    let t = Some(token.as_str());
    let student_id = create_student(&mut stdin, &mut reader, &token, "Seo");
    let missions = request_ok(&mut stdin, &mut reader, "1", "missions.list", t, json!({}));
    let choir = missions["missions"]
        .as_array()
        .and_then(|a| a.iter().find(|m| m["name"] == "Choir"))
        .map(|m| str_field(m, "id"))
        .expect("choir");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "completions.bulk",
        t,
        json!({
            "studentId": student_id,
            "completionDate": "2025-03-23",
            "completions": [
                { "missionId": choir, "result": { "completed": true } },
                { "missionId": "missing-mission", "result": { "completed": true } }
            ]
        }),
    );
    assert_eq!(code, "not_found");

    let day = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "completions.studentDay",
        t,
        json!({ "studentId": student_id, "date": "2025-03-23" }),
    );
    assert!(day["missions"]
        .as_array()
        .expect("missions")
        .iter()
        .all(|r| r["completion"].is_null()));
    let talents = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "talents.get",
        t,
        json!({ "studentId": student_id }),
    );
    assert_eq!(talents["totalTalents"].as_i64(), Some(0));
    assert_eq!(talents["history"].as_array().map(|a| a.len()), Some(0));
}
