use crate::error::AppResult;
use crate::ipc::handlers::{id_param, run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::model::Class;
use crate::repo::{classes, students};
use crate::validate::Params;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassSummary {
    #[serde(flatten)]
    class: Class,
    student_count: i64,
}

fn create(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let name = p.required_str("name");
    let description = p.optional_str("description");
    let grade = p.optional_i64("grade");
    p.finish()?;
    let class = classes::insert(
        ctx.conn,
        &ctx.principal.user_id,
        &name,
        description.as_deref(),
        grade,
    )?;
    to_json(&class)
}

fn list(ctx: &Ctx, _params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let rows: Vec<ClassSummary> = classes::list_with_counts(ctx.conn, &ctx.principal.user_id)?
        .into_iter()
        .map(|(class, student_count)| ClassSummary {
            class,
            student_count,
        })
        .collect();
    Ok(json!({ "classes": to_json(&rows)? }))
}

fn get(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "classId")?;
    let class = classes::get(ctx.conn, &ctx.principal.user_id, &id)?;
    let members = students::list_for_class(ctx.conn, &ctx.principal.user_id, &id)?;
    let mut out = to_json(&class)?;
    out["students"] = to_json(&members)?;
    Ok(out)
}

fn update(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let id = p.required_str("classId");
    let name = p.patch_name("name");
    let description = p.patch_str("description");
    let grade = p.patch_i64("grade");
    p.finish()?;

    let mut c = classes::get(ctx.conn, &ctx.principal.user_id, &id)?;
    if let Some(n) = name.apply(None) {
        c.name = n;
    }
    c.description = description.apply(c.description);
    c.grade = grade.apply(c.grade);
    classes::update(ctx.conn, &c)?;
    to_json(&classes::get(ctx.conn, &ctx.principal.user_id, &id)?)
}

fn delete(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "classId")?;
    classes::get(ctx.conn, &ctx.principal.user_id, &id)?;
    let tx = ctx.conn.unchecked_transaction()?;
    let unassigned = students::unassign_class(&tx, &id)?;
    classes::delete(&tx, &id)?;
    tx.commit()?;
    Ok(json!({ "ok": true, "unassignedStudents": unassigned }))
}

fn membership(ctx: &Ctx, params: &serde_json::Value) -> AppResult<(String, String)> {
    let mut p = Params::new(params);
    let class_id = p.required_str("classId");
    let student_id = p.required_str("studentId");
    p.finish()?;
    classes::get(ctx.conn, &ctx.principal.user_id, &class_id)?;
    students::get(ctx.conn, &ctx.principal.user_id, &student_id)?;
    Ok((class_id, student_id))
}

fn assign_student(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let (class_id, student_id) = membership(ctx, params)?;
    students::set_class(ctx.conn, &student_id, Some(&class_id))?;
    to_json(&students::get(ctx.conn, &ctx.principal.user_id, &student_id)?)
}

fn remove_student(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let (class_id, student_id) = membership(ctx, params)?;
    let s = students::get(ctx.conn, &ctx.principal.user_id, &student_id)?;
    if s.class_id.as_deref() == Some(class_id.as_str()) {
        students::set_class(ctx.conn, &student_id, None)?;
    }
    to_json(&students::get(ctx.conn, &ctx.principal.user_id, &student_id)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "classes.create" => create,
        "classes.list" => list,
        "classes.get" => get,
        "classes.update" => update,
        "classes.delete" => delete,
        "classes.assignStudent" => assign_student,
        "classes.removeStudent" => remove_student,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
