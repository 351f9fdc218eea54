use crate::db::{now_ts, today};
use crate::error::{AppError, AppResult};
use crate::model::{Talent, TalentEntryKind, TalentHistoryEntry, TalentSource};
use crate::repo::{new_id, students};
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, student_id, user_id, total_talents, earned_talents, spent_talents, talent_date, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<Talent> {
    Ok(Talent {
        id: r.get(0)?,
        student_id: r.get(1)?,
        user_id: r.get(2)?,
        total_talents: r.get(3)?,
        earned_talents: r.get(4)?,
        spent_talents: r.get(5)?,
        history: Vec::new(),
        talent_date: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
    })
}

fn history_from_row(r: &Row) -> rusqlite::Result<TalentHistoryEntry> {
    let kind: String = r.get(1)?;
    let source: String = r.get(3)?;
    Ok(TalentHistoryEntry {
        date: r.get(0)?,
        kind: if kind == "spent" {
            TalentEntryKind::Spent
        } else {
            TalentEntryKind::Earned
        },
        amount: r.get(2)?,
        source: if source == "mission" {
            TalentSource::Mission
        } else {
            TalentSource::Other
        },
        mission_id: r.get(4)?,
    })
}

fn load_history(conn: &Connection, talent_id: &str) -> AppResult<Vec<TalentHistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry_date, kind, amount, source, mission_id
         FROM talent_history
         WHERE talent_id = ?
         ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([talent_id], history_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_for_student(conn: &Connection, student_id: &str) -> AppResult<Option<Talent>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM talents WHERE student_id = ?", COLUMNS),
            [student_id],
            from_row,
        )
        .optional()?;
    match row {
        Some(mut t) => {
            t.history = load_history(conn, &t.id)?;
            Ok(Some(t))
        }
        None => Ok(None),
    }
}

/// The only place a Talent row is created. The owner is copied from the
/// student so the ledger stays scoped to the same teacher.
pub fn get_or_create(conn: &Connection, student_id: &str) -> AppResult<Talent> {
    if let Some(t) = find_for_student(conn, student_id)? {
        return Ok(t);
    }
    let user_id = students::owner_of(conn, student_id)?
        .ok_or_else(|| AppError::not_found("student"))?;
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO talents(id, student_id, user_id, total_talents, earned_talents, spent_talents, talent_date, created_at, updated_at)
         VALUES(?, ?, ?, 0, 0, 0, ?, ?, ?)",
        (&id, student_id, &user_id, today(), &now, &now),
    )?;
    tracing::debug!(student_id, talent_id = %id, "created talent ledger");
    find_for_student(conn, student_id)?
        .ok_or_else(|| AppError::Internal("talent row vanished after insert".into()))
}

/// Persists the counters and appends `entry` to the history log.
pub fn save_with_entry(conn: &Connection, t: &Talent, entry: &TalentHistoryEntry) -> AppResult<()> {
    conn.execute(
        "UPDATE talents
         SET total_talents = ?, earned_talents = ?, spent_talents = ?, updated_at = ?
         WHERE id = ?",
        (
            t.total_talents,
            t.earned_talents,
            t.spent_talents,
            now_ts(),
            &t.id,
        ),
    )?;
    conn.execute(
        "INSERT INTO talent_history(talent_id, seq, entry_date, kind, amount, source, mission_id)
         VALUES(?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM talent_history WHERE talent_id = ?), ?, ?, ?, ?, ?)",
        rusqlite::params![
            &t.id,
            &t.id,
            entry.date,
            entry.kind.as_str(),
            entry.amount,
            entry.source.as_str(),
            entry.mission_id
        ],
    )?;
    Ok(())
}
