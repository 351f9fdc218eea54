use chrono::Weekday;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub attendance_day: Weekday,
}

impl AppState {
    pub fn new(attendance_day: Weekday) -> Self {
        Self {
            workspace: None,
            db: None,
            attendance_day,
        }
    }
}
