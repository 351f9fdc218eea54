use crate::db::now_ts;
use crate::error::{AppError, AppResult};
use crate::model::Student;
use crate::repo::new_id;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str =
    "id, user_id, class_id, name, birthday, photo, parent_contact, address, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        user_id: r.get(1)?,
        class_id: r.get(2)?,
        name: r.get(3)?,
        birthday: r.get(4)?,
        photo: r.get(5)?,
        parent_contact: r.get(6)?,
        address: r.get(7)?,
        created_at: r.get(8)?,
        updated_at: r.get(9)?,
    })
}

#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub photo: Option<String>,
    pub parent_contact: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<String>,
}

pub fn insert(conn: &Connection, user_id: &str, s: &NewStudent) -> AppResult<Student> {
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO students(id, user_id, class_id, name, birthday, photo, parent_contact, address, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &id,
            user_id,
            s.class_id,
            s.name,
            s.birthday,
            s.photo,
            s.parent_contact,
            s.address,
            &now,
            &now
        ],
    )?;
    get(conn, user_id, &id)
}

pub fn find(conn: &Connection, user_id: &str, id: &str) -> AppResult<Option<Student>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM students WHERE id = ? AND user_id = ?",
                COLUMNS
            ),
            (id, user_id),
            from_row,
        )
        .optional()?)
}

pub fn get(conn: &Connection, user_id: &str, id: &str) -> AppResult<Student> {
    find(conn, user_id, id)?.ok_or_else(|| AppError::not_found("student"))
}

/// Owning teacher of a student, without an ownership filter.
pub fn owner_of(conn: &Connection, id: &str) -> AppResult<Option<String>> {
    Ok(conn
        .query_row("SELECT user_id FROM students WHERE id = ?", [id], |r| r.get(0))
        .optional()?)
}

pub fn list(conn: &Connection, user_id: &str) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students WHERE user_id = ? ORDER BY name, created_at",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map([user_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_for_class(conn: &Connection, user_id: &str, class_id: &str) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students WHERE user_id = ? AND class_id = ? ORDER BY name, created_at",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map((user_id, class_id), from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_for_user(conn: &Connection, user_id: &str) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM students WHERE user_id = ?",
        [user_id],
        |r| r.get(0),
    )?)
}

pub fn update(conn: &Connection, s: &Student) -> AppResult<()> {
    conn.execute(
        "UPDATE students
         SET class_id = ?, name = ?, birthday = ?, photo = ?, parent_contact = ?, address = ?, updated_at = ?
         WHERE id = ? AND user_id = ?",
        rusqlite::params![
            s.class_id,
            s.name,
            s.birthday,
            s.photo,
            s.parent_contact,
            s.address,
            now_ts(),
            s.id,
            s.user_id
        ],
    )?;
    Ok(())
}

pub fn set_class(conn: &Connection, id: &str, class_id: Option<&str>) -> AppResult<()> {
    conn.execute(
        "UPDATE students SET class_id = ?, updated_at = ? WHERE id = ?",
        (class_id, now_ts(), id),
    )?;
    Ok(())
}

pub fn unassign_class(conn: &Connection, class_id: &str) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE students SET class_id = NULL, updated_at = ? WHERE class_id = ?",
        (now_ts(), class_id),
    )?)
}

/// Removes a student and everything recorded against them. Callers run this
/// inside a transaction.
pub fn delete_cascade(conn: &Connection, id: &str) -> AppResult<()> {
    // Explicit dependency order; the schema has no ON DELETE CASCADE.
    conn.execute(
        "DELETE FROM talent_history
         WHERE talent_id IN (SELECT t.id FROM talents t WHERE t.student_id = ?)",
        [id],
    )?;
    conn.execute("DELETE FROM talents WHERE student_id = ?", [id])?;
    conn.execute("DELETE FROM mission_completions WHERE student_id = ?", [id])?;
    conn.execute("DELETE FROM attendance_records WHERE student_id = ?", [id])?;
    conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    Ok(())
}
