use crate::error::AppResult;
use crate::ipc::handlers::{id_param, run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::repo::{classes, students};
use crate::validate::Params;
use serde_json::json;

fn create(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let input = students::NewStudent {
        name: p.required_str("name"),
        birthday: p.optional_date("birthday"),
        photo: p.optional_str("photo"),
        parent_contact: p.optional_str("parentContact"),
        address: p.optional_str("address"),
        class_id: p.optional_str("classId"),
    };
    p.finish()?;
    if let Some(class_id) = input.class_id.as_deref() {
        classes::get(ctx.conn, &ctx.principal.user_id, class_id)?;
    }
    let student = students::insert(ctx.conn, &ctx.principal.user_id, &input)?;
    tracing::info!(student_id = %student.id, "student created");
    to_json(&student)
}

fn list(ctx: &Ctx, _params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let rows = students::list(ctx.conn, &ctx.principal.user_id)?;
    Ok(json!({ "students": to_json(&rows)? }))
}

fn get(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "studentId")?;
    to_json(&students::get(ctx.conn, &ctx.principal.user_id, &id)?)
}

fn update(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let id = p.required_str("studentId");
    let name = p.patch_name("name");
    let birthday = p.patch_date("birthday");
    let photo = p.patch_str("photo");
    let parent_contact = p.patch_str("parentContact");
    let address = p.patch_str("address");
    let class_id = p.patch_str("classId");
    p.finish()?;

    let mut s = students::get(ctx.conn, &ctx.principal.user_id, &id)?;
    if let Some(n) = name.apply(None) {
        s.name = n;
    }
    s.birthday = birthday.apply(s.birthday);
    s.photo = photo.apply(s.photo);
    s.parent_contact = parent_contact.apply(s.parent_contact);
    s.address = address.apply(s.address);
    s.class_id = class_id.apply(s.class_id);
    if let Some(class_id) = s.class_id.as_deref() {
        classes::get(ctx.conn, &ctx.principal.user_id, class_id)?;
    }
    students::update(ctx.conn, &s)?;
    to_json(&students::get(ctx.conn, &ctx.principal.user_id, &id)?)
}

fn delete(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "studentId")?;
    students::get(ctx.conn, &ctx.principal.user_id, &id)?;
    let tx = ctx.conn.unchecked_transaction()?;
    students::delete_cascade(&tx, &id)?;
    tx.commit()?;
    tracing::info!(student_id = %id, "student deleted with attendance, completions and talents");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "students.create" => create,
        "students.list" => list,
        "students.get" => get,
        "students.update" => update,
        "students.delete" => delete,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
