use crate::auth::{self as accounts, Registration, MIN_PASSWORD_LEN};
use crate::error::AppResult;
use crate::ipc::handlers::{require_db, respond, run_authed, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::validate::Params;
use serde_json::json;

fn register(state: &AppState, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let conn = require_db(state)?;
    let mut p = Params::new(params);
    let email = p.email("email");
    let password = p.required_str("password");
    p.min_len("password", &password, MIN_PASSWORD_LEN);
    let display_name = p.required_str("displayName");
    let date_of_birth = p.optional_date("dateOfBirth");
    p.finish()?;
    let token = accounts::register(
        conn,
        &Registration {
            email,
            password,
            display_name,
            date_of_birth,
        },
    )?;
    Ok(json!({ "accessToken": token }))
}

fn login(state: &AppState, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let conn = require_db(state)?;
    let mut p = Params::new(params);
    let email = p.email("email");
    let password = p.required_str("password");
    p.finish()?;
    let token = accounts::login(conn, &email, &password)?;
    Ok(json!({ "accessToken": token }))
}

fn logout(ctx: &Ctx, _params: &serde_json::Value) -> AppResult<serde_json::Value> {
    accounts::logout(ctx.conn, ctx.token)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(respond(req, register(state, &req.params))),
        "auth.login" => Some(respond(req, login(state, &req.params))),
        "auth.logout" => Some(run_authed(state, req, logout)),
        _ => None,
    }
}
