use crate::error::{AppError, AppResult};
use crate::ipc::handlers::{run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::model::CompletionResult;
use crate::talent::{self, BatchItem, NewCompletion};
use crate::validate::Params;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchItemParams {
    mission_id: String,
    result: CompletionResult,
}

fn create(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let student_id = p.required_str("studentId");
    let mission_id = p.required_str("missionId");
    let completion_date = p.required_date("completionDate");
    let result = p.required_object::<CompletionResult>("result");
    p.finish()?;
    let result = result.ok_or_else(|| AppError::bad_param("result", "missing result"))?;
    let saved = talent::create_completion(
        ctx.conn,
        &ctx.principal,
        &NewCompletion {
            student_id,
            mission_id,
            completion_date,
            result,
        },
    )?;
    to_json(&saved)
}

fn update(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let id = p.required_str("completionId");
    let result = p.required_object::<CompletionResult>("result");
    p.finish()?;
    let result = result.ok_or_else(|| AppError::bad_param("result", "missing result"))?;
    to_json(&talent::update_completion(
        ctx.conn,
        &ctx.principal,
        &id,
        &result,
    )?)
}

fn bulk(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let student_id = p.required_str("studentId");
    let date = p.required_date("completionDate");
    let items = p.required_object::<Vec<BatchItemParams>>("completions");
    p.finish()?;
    let items: Vec<BatchItem> = items
        .unwrap_or_default()
        .into_iter()
        .map(|i| BatchItem {
            mission_id: i.mission_id,
            result: i.result,
        })
        .collect();
    to_json(&talent::apply_batch(
        ctx.conn,
        &ctx.principal,
        &student_id,
        date,
        &items,
    )?)
}

fn student_day(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let student_id = p.required_str("studentId");
    let date = p
        .optional_date("date")
        .unwrap_or_else(crate::db::today);
    p.finish()?;
    let rows = talent::student_day(ctx.conn, &ctx.principal, &student_id, date)?;
    Ok(json!({ "date": date, "missions": to_json(&rows)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "completions.create" => create,
        "completions.update" => update,
        "completions.bulk" => bulk,
        "completions.studentDay" => student_day,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
