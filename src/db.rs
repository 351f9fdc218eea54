use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "classbook.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// RFC 3339 UTC timestamp used for created_at/updated_at columns.
pub fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            display_name TEXT,
            avatar_url TEXT,
            date_of_birth TEXT,
            role TEXT NOT NULL DEFAULT 'teacher',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auths(
            id TEXT PRIMARY KEY,
            identifier TEXT NOT NULL,
            credential TEXT,
            provider TEXT NOT NULL,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id),
            UNIQUE(identifier, provider)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions(
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            grade INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_user ON classes(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            birthday TEXT,
            photo TEXT,
            parent_contact TEXT,
            address TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    // Workspaces created before class grouping have no class_id column.
    ensure_students_class_id(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_user ON students(user_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_records(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            attendance_date TEXT NOT NULL,
            is_present INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(user_id) REFERENCES users(id),
            UNIQUE(student_id, attendance_date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_user_date ON attendance_records(user_id, attendance_date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS missions(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            kind TEXT NOT NULL,
            unit TEXT,
            max_value REAL,
            default_value REAL,
            talent_reward INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS mission_completions(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            mission_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            completion_date TEXT NOT NULL,
            result_json TEXT NOT NULL,
            talent_earned INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(mission_id) REFERENCES missions(id),
            FOREIGN KEY(user_id) REFERENCES users(id),
            UNIQUE(student_id, mission_id, completion_date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_completions_student_date ON mission_completions(student_id, completion_date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_completions_mission ON mission_completions(mission_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS talents(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            total_talents INTEGER NOT NULL DEFAULT 0,
            earned_talents INTEGER NOT NULL DEFAULT 0,
            spent_talents INTEGER NOT NULL DEFAULT 0,
            talent_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS talent_history(
            talent_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            entry_date TEXT NOT NULL,
            kind TEXT NOT NULL,
            amount INTEGER NOT NULL,
            source TEXT NOT NULL,
            mission_id TEXT,
            PRIMARY KEY(talent_id, seq),
            FOREIGN KEY(talent_id) REFERENCES talents(id)
        )",
        [],
    )?;

    Ok(())
}

fn ensure_students_class_id(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "class_id")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE students ADD COLUMN class_id TEXT REFERENCES classes(id)",
        [],
    )?;
    Ok(())
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
