use crate::db::now_ts;
use crate::error::{AppError, AppResult};
use crate::model::User;
use crate::repo::new_id;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

pub const PROVIDER_EMAIL: &str = "email";

const COLUMNS: &str = "id, display_name, avatar_url, date_of_birth, role, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        display_name: r.get(1)?,
        avatar_url: r.get(2)?,
        date_of_birth: r.get(3)?,
        role: r.get(4)?,
        created_at: r.get(5)?,
        updated_at: r.get(6)?,
    })
}

pub struct AuthRow {
    pub user_id: String,
    pub identifier: String,
    pub credential: Option<String>,
}

pub fn insert_user(
    conn: &Connection,
    display_name: &str,
    date_of_birth: Option<NaiveDate>,
) -> AppResult<User> {
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO users(id, display_name, date_of_birth, role, created_at, updated_at)
         VALUES(?, ?, ?, 'teacher', ?, ?)",
        (&id, display_name, date_of_birth, &now, &now),
    )?;
    get(conn, &id)
}

pub fn get(conn: &Connection, id: &str) -> AppResult<User> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?", COLUMNS),
        [id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("user"))
}

pub fn update_profile(
    conn: &Connection,
    id: &str,
    display_name: Option<&str>,
    avatar_url: Option<&str>,
) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET display_name = ?, avatar_url = ?, updated_at = ? WHERE id = ?",
        (display_name, avatar_url, now_ts(), id),
    )?;
    Ok(())
}

pub fn insert_auth(
    conn: &Connection,
    user_id: &str,
    identifier: &str,
    credential: &str,
    provider: &str,
) -> AppResult<()> {
    let now = now_ts();
    conn.execute(
        "INSERT INTO auths(id, identifier, credential, provider, user_id, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (new_id(), identifier, credential, provider, user_id, &now, &now),
    )?;
    Ok(())
}

pub fn find_auth(conn: &Connection, identifier: &str, provider: &str) -> AppResult<Option<AuthRow>> {
    Ok(conn
        .query_row(
            "SELECT user_id, identifier, credential FROM auths WHERE identifier = ? AND provider = ?",
            (identifier, provider),
            |r| {
                Ok(AuthRow {
                    user_id: r.get(0)?,
                    identifier: r.get(1)?,
                    credential: r.get(2)?,
                })
            },
        )
        .optional()?)
}

pub fn insert_session(conn: &Connection, token_hash: &str, user_id: &str, email: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sessions(token_hash, user_id, email, created_at) VALUES(?, ?, ?, ?)",
        (token_hash, user_id, email, now_ts()),
    )?;
    Ok(())
}

/// Returns `(user_id, email)` for a live session.
pub fn find_session(conn: &Connection, token_hash: &str) -> AppResult<Option<(String, String)>> {
    Ok(conn
        .query_row(
            "SELECT s.user_id, s.email
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?",
            [token_hash],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?)
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> AppResult<bool> {
    let n = conn.execute("DELETE FROM sessions WHERE token_hash = ?", [token_hash])?;
    Ok(n > 0)
}
