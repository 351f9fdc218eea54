mod test_support;

use serde_json::json;
use test_support::{
    create_student, register, request_err, request_ok, select_workspace, spawn_sidecar,
    spawn_sidecar_with, str_field,
};

#[test]
fn attendance_is_only_taken_on_sunday_by_default() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "classbook-attendance");
    let token = register(&mut stdin, &mut reader, "att@example.org");
    let t = Some(token.as_str());
    let hana = create_student(&mut stdin, &mut reader, &token, "Hana");
    let joon = create_student(&mut stdin, &mut reader, &token, "Joon");

    // 2025-03-03 is a Monday.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.create",
        t,
        json!({ "studentId": hana, "attendanceDate": "2025-03-03", "isPresent": true }),
    );
    assert_eq!(code, "bad_params");

    let rec = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.create",
        t,
        json!({ "studentId": hana, "attendanceDate": "2025-03-02", "isPresent": true }),
    );
    assert_eq!(rec["attendanceDate"], "2025-03-02");
    let rec_id = str_field(&rec, "id");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.create",
        t,
        json!({ "studentId": hana, "attendanceDate": "2025-03-02", "isPresent": false }),
    );
    assert_eq!(code, "conflict");

    let batch = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.upsertBatch",
        t,
        json!({ "records": [
            { "studentId": hana, "attendanceDate": "2025-03-02", "isPresent": false, "notes": "sick" },
            { "studentId": joon, "attendanceDate": "2025-03-02", "isPresent": true }
        ] }),
    );
    let saved = batch["records"].as_array().expect("records");
    assert_eq!(saved.len(), 2);
    assert_eq!(str_field(&saved[0], "id"), rec_id, "existing record is overwritten");

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.listByDate",
        t,
        json!({ "date": "2025-03-02" }),
    );
    let rows = listed["records"].as_array().expect("records");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["studentName"], "Hana");
    assert_eq!(rows[0]["notes"], "sick");

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.summary",
        t,
        json!({ "date": "2025-03-02" }),
    );
    assert_eq!(summary["totalStudents"].as_i64(), Some(2));
    assert_eq!(summary["presentToday"].as_i64(), Some(1));

    // A batch with one weekday record stores nothing.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.upsertBatch",
        t,
        json!({ "records": [
            { "studentId": hana, "attendanceDate": "2025-03-09", "isPresent": true },
            { "studentId": joon, "attendanceDate": "2025-03-12", "isPresent": true }
        ] }),
    );
    assert_eq!(code, "bad_params");
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.listByDate",
        t,
        json!({ "date": "2025-03-09" }),
    );
    assert_eq!(listed["records"].as_array().map(|a| a.len()), Some(0));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.update",
        t,
        json!({ "attendanceId": rec_id, "attendanceDate": "2025-03-04" }),
    );
    assert_eq!(code, "bad_params");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "attendance.delete",
        t,
        json!({ "attendanceId": rec_id }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "11",
        "attendance.get",
        t,
        json!({ "attendanceId": rec_id }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn meeting_day_is_configurable() {
    let (_child, mut stdin, mut reader) = spawn_sidecar_with(&["--attendance-day", "sat"]);
    let health = request_ok(&mut stdin, &mut reader, "h", "health", None, json!({}));
    assert_eq!(health["attendanceDay"], "Saturday");
    let _ = select_workspace(&mut stdin, &mut reader, "classbook-attendance-sat");
    let token = register(&mut stdin, &mut reader, "sat@example.org");
    let t = Some(token.as_str());
    let student = create_student(&mut stdin, &mut reader, &token, "Yuna");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.create",
        t,
        json!({ "studentId": student, "attendanceDate": "2025-03-02", "isPresent": true }),
    );
    assert_eq!(code, "bad_params");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.create",
        t,
        json!({ "studentId": student, "attendanceDate": "2025-03-01", "isPresent": true }),
    );
}
