use crate::db::now_ts;
use crate::error::{AppError, AppResult};
use crate::model::AttendanceRecord;
use crate::repo::new_id;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str =
    "id, student_id, user_id, attendance_date, is_present, notes, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        user_id: r.get(2)?,
        attendance_date: r.get(3)?,
        is_present: r.get::<_, i64>(4)? != 0,
        notes: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn insert(
    conn: &Connection,
    user_id: &str,
    student_id: &str,
    date: NaiveDate,
    is_present: bool,
    notes: Option<&str>,
) -> AppResult<AttendanceRecord> {
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO attendance_records(id, student_id, user_id, attendance_date, is_present, notes, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (&id, student_id, user_id, date, is_present as i64, notes, &now, &now),
    )?;
    get(conn, user_id, &id)
}

pub fn get(conn: &Connection, user_id: &str, id: &str) -> AppResult<AttendanceRecord> {
    conn.query_row(
        &format!(
            "SELECT {} FROM attendance_records WHERE id = ? AND user_id = ?",
            COLUMNS
        ),
        (id, user_id),
        from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("attendance record"))
}

pub fn find_for_student_day(
    conn: &Connection,
    user_id: &str,
    student_id: &str,
    date: NaiveDate,
) -> AppResult<Option<AttendanceRecord>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM attendance_records
                 WHERE student_id = ? AND attendance_date = ? AND user_id = ?",
                COLUMNS
            ),
            (student_id, date, user_id),
            from_row,
        )
        .optional()?)
}

/// Records for one day together with the student's name.
pub fn list_for_date(
    conn: &Connection,
    user_id: &str,
    date: NaiveDate,
) -> AppResult<Vec<(AttendanceRecord, String)>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.student_id, a.user_id, a.attendance_date, a.is_present, a.notes, a.created_at, a.updated_at,
                s.name
         FROM attendance_records a
         JOIN students s ON s.id = a.student_id
         WHERE a.user_id = ? AND a.attendance_date = ?
         ORDER BY s.name, a.rowid",
    )?;
    let rows = stmt
        .query_map((user_id, date), |r| Ok((from_row(r)?, r.get::<_, String>(8)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update(conn: &Connection, rec: &AttendanceRecord) -> AppResult<()> {
    conn.execute(
        "UPDATE attendance_records
         SET attendance_date = ?, is_present = ?, notes = ?, updated_at = ?
         WHERE id = ? AND user_id = ?",
        (
            rec.attendance_date,
            rec.is_present as i64,
            &rec.notes,
            now_ts(),
            &rec.id,
            &rec.user_id,
        ),
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
    conn.execute("DELETE FROM attendance_records WHERE id = ?", [id])?;
    Ok(())
}

pub fn count_present(conn: &Connection, user_id: &str, date: NaiveDate) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM attendance_records
         WHERE user_id = ? AND attendance_date = ? AND is_present = 1",
        (user_id, date),
        |r| r.get(0),
    )?)
}
