mod test_support;

use serde_json::json;
use test_support::{
    create_student, register, request_err, request_ok, select_workspace, spawn_sidecar, str_field,
};

#[test]
fn class_membership_and_class_delete_keep_students() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "classbook-classes");
    let token = register(&mut stdin, &mut reader, "classes@example.org");
    let t = Some(token.as_str());

    let class = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "classes.create",
        t,
        json!({ "name": "Grade 3", "description": "Sunday school", "grade": 3 }),
    );
    let class_id = str_field(&class, "id");
    let hana = create_student(&mut stdin, &mut reader, &token, "Hana");
    let joon = create_student(&mut stdin, &mut reader, &token, "Joon");

    for (id, sid) in [("2", &hana), ("3", &joon)] {
        let s = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "classes.assignStudent",
            t,
            json!({ "classId": class_id, "studentId": sid }),
        );
        assert_eq!(s["classId"].as_str(), Some(class_id.as_str()));
    }

    let listed = request_ok(&mut stdin, &mut reader, "4", "classes.list", t, json!({}));
    assert_eq!(listed["classes"][0]["studentCount"].as_i64(), Some(2));
    assert_eq!(listed["classes"][0]["name"], "Grade 3");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "classes.removeStudent",
        t,
        json!({ "classId": class_id, "studentId": joon }),
    );
    let detail = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "classes.get",
        t,
        json!({ "classId": class_id }),
    );
    let members = detail["students"].as_array().expect("students");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["name"], "Hana");

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "classes.update",
        t,
        json!({ "classId": class_id, "grade": null, "name": "Grade 4" }),
    );
    assert_eq!(updated["name"], "Grade 4");
    assert!(updated["grade"].is_null());

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "classes.delete",
        t,
        json!({ "classId": class_id }),
    );
    assert_eq!(deleted["unassignedStudents"].as_i64(), Some(1));
    let s = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "students.get",
        t,
        json!({ "studentId": hana }),
    );
    assert!(s["classId"].is_null());
}

#[test]
fn student_update_and_delete_cascade() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "classbook-students");
    let token = register(&mut stdin, &mut reader, "students@example.org");
    let t = Some(token.as_str());

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        t,
        json!({ "name": "  ", "birthday": "yesterday" }),
    );
    assert_eq!(code, "bad_params");

    let student = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        t,
        json!({ "name": "Mina", "birthday": "2016-05-04", "parentContact": "010-1234" }),
    );
    let sid = str_field(&student, "id");
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.update",
        t,
        json!({ "studentId": sid, "parentContact": null, "address": "Seoul" }),
    );
    assert!(updated["parentContact"].is_null());
    assert_eq!(updated["address"], "Seoul");
    assert_eq!(updated["birthday"], "2016-05-04");

    let missions = request_ok(&mut stdin, &mut reader, "4", "missions.list", t, json!({}));
    let choir = missions["missions"]
        .as_array()
        .and_then(|a| a.iter().find(|m| m["name"] == "Choir"))
        .map(|m| str_field(m, "id"))
        .expect("choir");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "completions.create",
        t,
        json!({
            "studentId": sid,
            "missionId": choir,
            "completionDate": "2025-03-02",
            "result": { "completed": true }
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.create",
        t,
        json!({ "studentId": sid, "attendanceDate": "2025-03-02", "isPresent": true }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.delete",
        t,
        json!({ "studentId": sid }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "talents.get",
        t,
        json!({ "studentId": sid }),
    );
    assert_eq!(code, "not_found");
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.summary",
        t,
        json!({ "date": "2025-03-02" }),
    );
    assert_eq!(summary["totalStudents"].as_i64(), Some(0));
    assert_eq!(summary["presentToday"].as_i64(), Some(0));

    // The mission no longer has completions and can be removed.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "missions.delete",
        t,
        json!({ "missionId": choir }),
    );
}
