use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::ipc::handlers::{id_param, run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::model::MissionConfig;
use crate::repo::missions::{self, MissionDraft};
use crate::validate::Params;
use serde_json::json;

fn list(ctx: &Ctx, _params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let rows = catalog::list_active(ctx.conn)?;
    Ok(json!({ "missions": to_json(&rows)? }))
}

fn get(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "missionId")?;
    to_json(&missions::get(ctx.conn, &id)?)
}

fn create(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let name = p.required_str("name");
    let description = p.optional_str("description");
    let config = p.required_object::<MissionConfig>("config");
    let talent_reward = p.optional_i64("talentReward").unwrap_or(1);
    let is_active = p.optional_bool("isActive").unwrap_or(true);
    let sort_order = p.optional_i64("sortOrder").unwrap_or(0);
    p.finish()?;
    let Some(config) = config else {
        return Err(AppError::bad_param("config", "missing config"));
    };
    let mission = catalog::create(
        ctx.conn,
        &MissionDraft {
            name,
            description,
            config,
            talent_reward,
            is_active,
            sort_order,
        },
    )?;
    tracing::info!(mission_id = %mission.id, "mission created");
    to_json(&mission)
}

fn update(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let id = p.required_str("missionId");
    let name = p.patch_name("name");
    let description = p.patch_str("description");
    let config = p.optional_object::<MissionConfig>("config");
    let talent_reward = p.optional_i64("talentReward");
    let is_active = p.optional_bool("isActive");
    let sort_order = p.optional_i64("sortOrder");
    p.finish()?;

    let mut m = missions::get(ctx.conn, &id)?;
    if let Some(n) = name.apply(None) {
        m.name = n;
    }
    m.description = description.apply(m.description);
    if let Some(c) = config {
        m.config = c;
    }
    if let Some(r) = talent_reward {
        m.talent_reward = r;
    }
    if let Some(a) = is_active {
        m.is_active = a;
    }
    if let Some(o) = sort_order {
        m.sort_order = o;
    }
    to_json(&catalog::update(ctx.conn, &m)?)
}

fn delete(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let id = id_param(params, "missionId")?;
    catalog::delete(ctx.conn, &id)?;
    Ok(json!({ "ok": true }))
}

fn seed_defaults(ctx: &Ctx, _params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let inserted = catalog::seed_defaults(ctx.conn)?;
    Ok(json!({ "inserted": inserted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "missions.list" => list,
        "missions.get" => get,
        "missions.create" => create,
        "missions.update" => update,
        "missions.delete" => delete,
        "missions.seedDefaults" => seed_defaults,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
