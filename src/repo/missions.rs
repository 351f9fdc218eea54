use crate::db::now_ts;
use crate::error::{AppError, AppResult};
use crate::model::{Mission, MissionConfig, MissionKind};
use crate::repo::new_id;
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, name, description, kind, unit, max_value, default_value, talent_reward, is_active, sort_order, created_at, updated_at";

fn from_row(r: &Row) -> rusqlite::Result<Mission> {
    let kind_raw: String = r.get(3)?;
    let kind = MissionKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown mission kind {:?}", kind_raw).into(),
        )
    })?;
    Ok(Mission {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        config: MissionConfig {
            kind,
            unit: r.get(4)?,
            max_value: r.get(5)?,
            default_value: r.get(6)?,
        },
        talent_reward: r.get(7)?,
        is_active: r.get::<_, i64>(8)? != 0,
        sort_order: r.get(9)?,
        created_at: r.get(10)?,
        updated_at: r.get(11)?,
    })
}

#[derive(Debug, Clone)]
pub struct MissionDraft {
    pub name: String,
    pub description: Option<String>,
    pub config: MissionConfig,
    pub talent_reward: i64,
    pub is_active: bool,
    pub sort_order: i64,
}

pub fn insert(conn: &Connection, m: &MissionDraft) -> AppResult<Mission> {
    let id = new_id();
    let now = now_ts();
    conn.execute(
        "INSERT INTO missions(id, name, description, kind, unit, max_value, default_value, talent_reward, is_active, sort_order, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &id,
            m.name,
            m.description,
            m.config.kind.as_str(),
            m.config.unit,
            m.config.max_value,
            m.config.default_value,
            m.talent_reward,
            m.is_active as i64,
            m.sort_order,
            &now,
            &now
        ],
    )?;
    get(conn, &id)
}

pub fn find(conn: &Connection, id: &str) -> AppResult<Option<Mission>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM missions WHERE id = ?", COLUMNS),
            [id],
            from_row,
        )
        .optional()?)
}

pub fn get(conn: &Connection, id: &str) -> AppResult<Mission> {
    find(conn, id)?.ok_or_else(|| AppError::not_found("mission"))
}

pub fn exists_by_name(conn: &Connection, name: &str) -> AppResult<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM missions WHERE name = ?", [name], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?
        .is_some())
}

pub fn list_active(conn: &Connection) -> AppResult<Vec<Mission>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM missions WHERE is_active = 1 ORDER BY sort_order, created_at, rowid",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update(conn: &Connection, m: &Mission) -> AppResult<()> {
    conn.execute(
        "UPDATE missions
         SET name = ?, description = ?, kind = ?, unit = ?, max_value = ?, default_value = ?,
             talent_reward = ?, is_active = ?, sort_order = ?, updated_at = ?
         WHERE id = ?",
        rusqlite::params![
            m.name,
            m.description,
            m.config.kind.as_str(),
            m.config.unit,
            m.config.max_value,
            m.config.default_value,
            m.talent_reward,
            m.is_active as i64,
            m.sort_order,
            now_ts(),
            m.id
        ],
    )?;
    Ok(())
}

pub fn completion_count(conn: &Connection, id: &str) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM mission_completions WHERE mission_id = ?",
        [id],
        |r| r.get(0),
    )?)
}

pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
    conn.execute("DELETE FROM missions WHERE id = ?", [id])?;
    Ok(())
}
