use crate::db::now_ts;
use crate::error::{AppError, AppResult};
use crate::model::Class;
use crate::repo::new_id;
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, user_id, name, description, grade, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<Class> {
    Ok(Class {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        description: r.get(3)?,
        grade: r.get(4)?,
        created_at: r.get(5)?,
        updated_at: r.get(6)?,
    })
}

pub fn insert(
    conn: &Connection,
    user_id: &str,
    name: &str,
    description: Option<&str>,
    grade: Option<i64>,
) -> AppResult<Class> {
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO classes(id, user_id, name, description, grade, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (&id, user_id, name, description, grade, &now, &now),
    )?;
    get(conn, user_id, &id)
}

pub fn get(conn: &Connection, user_id: &str, id: &str) -> AppResult<Class> {
    conn.query_row(
        &format!(
            "SELECT {} FROM classes WHERE id = ? AND user_id = ?",
            COLUMNS
        ),
        (id, user_id),
        from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("class"))
}

/// Classes with their member counts, newest first.
pub fn list_with_counts(conn: &Connection, user_id: &str) -> AppResult<Vec<(Class, i64)>> {
    // Correlated subquery keeps the count independent of any join fan-out.
    let mut stmt = conn.prepare(
        "SELECT
           c.id, c.user_id, c.name, c.description, c.grade, c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
         FROM classes c
         WHERE c.user_id = ?
         ORDER BY c.created_at DESC, c.rowid DESC",
    )?;
    let rows = stmt
        .query_map([user_id], |r| Ok((from_row(r)?, r.get::<_, i64>(7)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update(conn: &Connection, c: &Class) -> AppResult<()> {
    conn.execute(
        "UPDATE classes SET name = ?, description = ?, grade = ?, updated_at = ?
         WHERE id = ? AND user_id = ?",
        (&c.name, &c.description, c.grade, now_ts(), &c.id, &c.user_id),
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
    conn.execute("DELETE FROM classes WHERE id = ?", [id])?;
    Ok(())
}
