use crate::attendance::{self, AttendanceInput, AttendancePatch};
use crate::error::AppResult;
use crate::ipc::handlers::{id_param, run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceRecord;
use crate::repo::attendance as records;
use crate::validate::Params;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordParams {
    student_id: String,
    attendance_date: NaiveDate,
    is_present: bool,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordWithStudent {
    #[serde(flatten)]
    record: AttendanceRecord,
    student_name: String,
}

fn create(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let input = AttendanceInput {
        student_id: p.required_str("studentId"),
        attendance_date: p.required_date("attendanceDate"),
        is_present: p.required_bool("isPresent"),
        notes: p.optional_str("notes"),
    };
    p.finish()?;
    to_json(&attendance::create(
        ctx.conn,
        &ctx.principal,
        ctx.attendance_day,
        &input,
    )?)
}

fn list_by_date(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let date = p.required_date("date");
    p.finish()?;
    let rows: Vec<RecordWithStudent> = records::list_for_date(ctx.conn, &ctx.principal.user_id, date)?
        .into_iter()
        .map(|(record, student_name)| RecordWithStudent {
            record,
            student_name,
        })
        .collect();
    Ok(json!({ "date": date, "records": to_json(&rows)? }))
}

fn get(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "attendanceId")?;
    to_json(&records::get(ctx.conn, &ctx.principal.user_id, &id)?)
}

fn update(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let id = p.required_str("attendanceId");
    let patch = AttendancePatch {
        attendance_date: p.optional_date("attendanceDate"),
        is_present: p.optional_bool("isPresent"),
        notes: p.patch_str("notes"),
    };
    p.finish()?;
    to_json(&attendance::update(
        ctx.conn,
        &ctx.principal,
        ctx.attendance_day,
        &id,
        patch,
    )?)
}

fn delete(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "attendanceId")?;
    attendance::delete(ctx.conn, &ctx.principal, &id)?;
    Ok(json!({ "ok": true }))
}

fn upsert_batch(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let rows = p.required_object::<Vec<RecordParams>>("records");
    p.finish()?;
    let inputs: Vec<AttendanceInput> = rows
        .unwrap_or_default()
        .into_iter()
        .map(|r| AttendanceInput {
            student_id: r.student_id,
            attendance_date: r.attendance_date,
            is_present: r.is_present,
            notes: r.notes,
        })
        .collect();
    let saved = attendance::upsert_batch(ctx.conn, &ctx.principal, ctx.attendance_day, &inputs)?;
    Ok(json!({ "records": to_json(&saved)? }))
}

fn summary(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let date = p.optional_date("date").unwrap_or_else(crate::db::today);
    p.finish()?;
    to_json(&attendance::summary(ctx.conn, &ctx.principal, date)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "attendance.create" => create,
        "attendance.listByDate" => list_by_date,
        "attendance.get" => get,
        "attendance.update" => update,
        "attendance.delete" => delete,
        "attendance.upsertBatch" => upsert_batch,
        "attendance.summary" => summary,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
