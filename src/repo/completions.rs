use crate::db::now_ts;
use crate::error::{AppError, AppResult};
use crate::model::{CompletionResult, MissionCompletion};
use crate::repo::new_id;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, student_id, mission_id, user_id, completion_date, result_json, talent_earned, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<MissionCompletion> {
    let result_json: String = r.get(5)?;
    let result: CompletionResult = serde_json::from_str(&result_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MissionCompletion {
        id: r.get(0)?,
        student_id: r.get(1)?,
        mission_id: r.get(2)?,
        user_id: r.get(3)?,
        completion_date: r.get(4)?,
        result,
        talent_earned: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
    })
}

fn result_text(result: &CompletionResult) -> AppResult<String> {
    serde_json::to_string(result).map_err(|e| AppError::Internal(e.to_string()))
}

/// Duplicate guard: the completion already stored for this day, if any.
pub fn find_existing(
    conn: &Connection,
    student_id: &str,
    mission_id: &str,
    date: NaiveDate,
) -> AppResult<Option<MissionCompletion>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM mission_completions
                 WHERE student_id = ? AND mission_id = ? AND completion_date = ?",
                COLUMNS
            ),
            (student_id, mission_id, date),
            from_row,
        )
        .optional()?)
}

pub fn get_owned(conn: &Connection, user_id: &str, id: &str) -> AppResult<MissionCompletion> {
    conn.query_row(
        &format!(
            "SELECT {} FROM mission_completions WHERE id = ? AND user_id = ?",
            COLUMNS
        ),
        (id, user_id),
        from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("mission completion"))
}

pub fn insert(
    conn: &Connection,
    user_id: &str,
    student_id: &str,
    mission_id: &str,
    date: NaiveDate,
    result: &CompletionResult,
    talent_earned: i64,
) -> AppResult<MissionCompletion> {
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO mission_completions(id, student_id, mission_id, user_id, completion_date, result_json, talent_earned, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &id,
            student_id,
            mission_id,
            user_id,
            date,
            result_text(result)?,
            talent_earned,
            &now,
            &now
        ],
    )?;
    conn.query_row(
        &format!("SELECT {} FROM mission_completions WHERE id = ?", COLUMNS),
        [&id],
        from_row,
    )
    .map_err(AppError::from)
}

/// Stores a new result snapshot and returns the updated row.
pub fn update_result(
    conn: &Connection,
    existing: &MissionCompletion,
    result: &CompletionResult,
    talent_earned: i64,
) -> AppResult<MissionCompletion> {
    let now = now_ts();
    conn.execute(
        "UPDATE mission_completions SET result_json = ?, talent_earned = ?, updated_at = ? WHERE id = ?",
        (result_text(result)?, talent_earned, &now, &existing.id),
    )?;
    Ok(MissionCompletion {
        result: result.clone(),
        talent_earned,
        updated_at: now,
        ..existing.clone()
    })
}

pub fn list_for_student_day(
    conn: &Connection,
    student_id: &str,
    date: NaiveDate,
) -> AppResult<Vec<MissionCompletion>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM mission_completions
         WHERE student_id = ? AND completion_date = ?
         ORDER BY created_at, rowid",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map((student_id, date), from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
