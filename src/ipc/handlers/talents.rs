use crate::error::AppResult;
use crate::ipc::handlers::{id_param, run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::talent;

fn get(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let student_id = id_param(params, "studentId")?;
    to_json(&talent::student_talents(ctx.conn, &ctx.principal, &student_id)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "talents.get" => get,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
