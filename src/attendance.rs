use crate::error::{AppError, AppResult};
use crate::model::{AttendanceRecord, Principal};
use crate::repo::{attendance, students};
use crate::validate::Patch;
use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::Connection;
use serde::Serialize;

/// Attendance is only taken on the configured meeting day.
pub fn is_allowed_day(date: NaiveDate, meeting_day: Weekday) -> bool {
    date.weekday() == meeting_day
}

fn ensure_allowed_day(date: NaiveDate, meeting_day: Weekday) -> AppResult<()> {
    if is_allowed_day(date, meeting_day) {
        return Ok(());
    }
    Err(AppError::bad_param(
        "attendanceDate",
        format!(
            "attendance can only be recorded on {} ({} is a {})",
            weekday_name(meeting_day),
            date,
            weekday_name(date.weekday())
        ),
    ))
}

pub fn weekday_name(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceInput {
    pub student_id: String,
    pub attendance_date: NaiveDate,
    pub is_present: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AttendancePatch {
    pub attendance_date: Option<NaiveDate>,
    pub is_present: Option<bool>,
    pub notes: Patch<String>,
}

pub fn create(
    conn: &Connection,
    principal: &Principal,
    meeting_day: Weekday,
    input: &AttendanceInput,
) -> AppResult<AttendanceRecord> {
    ensure_allowed_day(input.attendance_date, meeting_day)?;
    students::get(conn, &principal.user_id, &input.student_id)?;
    if attendance::find_for_student_day(
        conn,
        &principal.user_id,
        &input.student_id,
        input.attendance_date,
    )?
    .is_some()
    {
        return Err(AppError::Conflict(
            "attendance already recorded for this student and date".to_string(),
        ));
    }
    attendance::insert(
        conn,
        &principal.user_id,
        &input.student_id,
        input.attendance_date,
        input.is_present,
        input.notes.as_deref(),
    )
}

pub fn update(
    conn: &Connection,
    principal: &Principal,
    meeting_day: Weekday,
    id: &str,
    patch: AttendancePatch,
) -> AppResult<AttendanceRecord> {
    let mut rec = attendance::get(conn, &principal.user_id, id)?;
    if let Some(date) = patch.attendance_date {
        ensure_allowed_day(date, meeting_day)?;
        rec.attendance_date = date;
    }
    if let Some(p) = patch.is_present {
        rec.is_present = p;
    }
    rec.notes = patch.notes.apply(rec.notes);
    attendance::update(conn, &rec)?;
    attendance::get(conn, &principal.user_id, id)
}

pub fn delete(conn: &Connection, principal: &Principal, id: &str) -> AppResult<()> {
    attendance::get(conn, &principal.user_id, id)?;
    attendance::delete(conn, id)
}

/// Creates or overwrites one record per (student, date). The whole batch is
/// validated against the meeting day and applied atomically.
pub fn upsert_batch(
    conn: &Connection,
    principal: &Principal,
    meeting_day: Weekday,
    records: &[AttendanceInput],
) -> AppResult<Vec<AttendanceRecord>> {
    let tx = conn.unchecked_transaction()?;
    let mut saved = Vec::with_capacity(records.len());
    for input in records {
        ensure_allowed_day(input.attendance_date, meeting_day)?;
        students::get(&tx, &principal.user_id, &input.student_id)?;
        match attendance::find_for_student_day(
            &tx,
            &principal.user_id,
            &input.student_id,
            input.attendance_date,
        )? {
            Some(mut existing) => {
                existing.is_present = input.is_present;
                existing.notes = Some(input.notes.clone().unwrap_or_default());
                attendance::update(&tx, &existing)?;
                saved.push(attendance::get(&tx, &principal.user_id, &existing.id)?);
            }
            None => saved.push(attendance::insert(
                &tx,
                &principal.user_id,
                &input.student_id,
                input.attendance_date,
                input.is_present,
                input.notes.as_deref(),
            )?),
        }
    }
    tx.commit()?;
    Ok(saved)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_students: i64,
    pub present_today: i64,
}

pub fn summary(conn: &Connection, principal: &Principal, date: NaiveDate) -> AppResult<AttendanceSummary> {
    Ok(AttendanceSummary {
        total_students: students::count_for_user(conn, &principal.user_id)?,
        present_today: attendance::count_present(conn, &principal.user_id, date)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::students::NewStudent;
    use crate::repo::users;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn only_the_meeting_day_is_allowed() {
        // 2025-03-03 is a Monday, 2025-03-02 the Sunday before it.
        assert!(!is_allowed_day(ymd(2025, 3, 3), Weekday::Sun));
        assert!(is_allowed_day(ymd(2025, 3, 2), Weekday::Sun));
        assert!(is_allowed_day(ymd(2025, 3, 3), Weekday::Mon));
    }

    fn setup() -> (Connection, Principal, String) {
        let conn = crate::db::open_in_memory().expect("open");
        let user = users::insert_user(&conn, "T", None).expect("user");
        let principal = Principal {
            user_id: user.id,
            email: "t@example.org".into(),
        };
        let s = students::insert(
            &conn,
            &principal.user_id,
            &NewStudent {
                name: "Joon".into(),
                ..Default::default()
            },
        )
        .expect("student");
        (conn, principal, s.id)
    }

    #[test]
    fn monday_is_rejected_sunday_accepted() {
        let (conn, principal, sid) = setup();
        let mut input = AttendanceInput {
            student_id: sid,
            attendance_date: ymd(2025, 3, 3),
            is_present: true,
            notes: None,
        };
        let err = create(&conn, &principal, Weekday::Sun, &input).expect_err("monday");
        assert_eq!(err.code(), "bad_params");
        input.attendance_date = ymd(2025, 3, 2);
        let rec = create(&conn, &principal, Weekday::Sun, &input).expect("sunday");
        assert!(rec.is_present);
        let again = create(&conn, &principal, Weekday::Sun, &input).expect_err("dup");
        assert_eq!(again.code(), "conflict");
    }

    #[test]
    fn update_rechecks_new_date() {
        let (conn, principal, sid) = setup();
        let rec = create(
            &conn,
            &principal,
            Weekday::Sun,
            &AttendanceInput {
                student_id: sid,
                attendance_date: ymd(2025, 3, 9),
                is_present: false,
                notes: Some("late".into()),
            },
        )
        .expect("create");
        let err = update(
            &conn,
            &principal,
            Weekday::Sun,
            &rec.id,
            AttendancePatch {
                attendance_date: Some(ymd(2025, 3, 12)),
                ..Default::default()
            },
        )
        .expect_err("wednesday");
        assert_eq!(err.code(), "bad_params");
        let moved = update(
            &conn,
            &principal,
            Weekday::Sun,
            &rec.id,
            AttendancePatch {
                attendance_date: Some(ymd(2025, 3, 16)),
                is_present: Some(true),
                notes: Patch::Clear,
            },
        )
        .expect("sunday");
        assert_eq!(moved.attendance_date, ymd(2025, 3, 16));
        assert!(moved.is_present);
        assert_eq!(moved.notes, None);
    }

    #[test]
    fn batch_upsert_overwrites_and_summarizes() {
        let (conn, principal, sid) = setup();
        let sunday = ymd(2025, 4, 6);
        let first = upsert_batch(
            &conn,
            &principal,
            Weekday::Sun,
            &[AttendanceInput {
                student_id: sid.clone(),
                attendance_date: sunday,
                is_present: false,
                notes: None,
            }],
        )
        .expect("first");
        let second = upsert_batch(
            &conn,
            &principal,
            Weekday::Sun,
            &[AttendanceInput {
                student_id: sid.clone(),
                attendance_date: sunday,
                is_present: true,
                notes: None,
            }],
        )
        .expect("second");
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(second[0].notes.as_deref(), Some(""));
        let s = summary(&conn, &principal, sunday).expect("summary");
        assert_eq!(s.total_students, 1);
        assert_eq!(s.present_today, 1);
    }
}
