pub mod attendance;
pub mod auth;
pub mod classes;
pub mod completions;
pub mod core;
pub mod missions;
pub mod profile;
pub mod students;
pub mod talents;

use crate::auth as accounts;
use crate::error::{AppError, AppResult};
use crate::ipc::error::{fail, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Principal;
use chrono::Weekday;
use rusqlite::Connection;
use serde::Serialize;

/// What an authenticated handler gets to work with.
pub struct Ctx<'a> {
    pub conn: &'a Connection,
    pub principal: Principal,
    pub token: &'a str,
    pub attendance_day: Weekday,
}

pub type AuthedOp = fn(&Ctx, &serde_json::Value) -> AppResult<serde_json::Value>;

pub fn require_db<'a>(state: &'a AppState) -> AppResult<&'a Connection> {
    state.db.as_ref().ok_or(AppError::NoWorkspace)
}

fn authorize<'a>(state: &'a AppState, req: &'a Request) -> AppResult<Ctx<'a>> {
    let conn = require_db(state)?;
    let principal = accounts::resolve_principal(conn, req.token.as_deref())?;
    Ok(Ctx {
        conn,
        principal,
        token: req.token.as_deref().unwrap_or_default(),
        attendance_day: state.attendance_day,
    })
}

/// Resolves the caller, runs `op` and wraps the outcome in an envelope.
pub fn run_authed(state: &AppState, req: &Request, op: AuthedOp) -> serde_json::Value {
    match authorize(state, req).and_then(|ctx| op(&ctx, &req.params)) {
        Ok(result) => ok(&req.id, result),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn respond(req: &Request, result: AppResult<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// Reads the record id every by-id method takes.
pub fn id_param(params: &serde_json::Value, key: &str) -> AppResult<String> {
    let mut p = crate::validate::Params::new(params);
    let id = p.required_str(key);
    p.finish()?;
    Ok(id)
}
