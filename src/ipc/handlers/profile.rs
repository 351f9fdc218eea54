use crate::auth as accounts;
use crate::error::AppResult;
use crate::ipc::handlers::{run_authed, to_json, AuthedOp, Ctx};
use crate::ipc::types::{AppState, Request};
use crate::repo::users;
use crate::validate::Params;

fn get(ctx: &Ctx, _params: &serde_json::Value) -> AppResult<serde_json::Value> {
    to_json(&accounts::profile(ctx.conn, &ctx.principal)?)
}

fn update(ctx: &Ctx, params: &serde_json::Value) -> AppResult<serde_json::Value> {
    let mut p = Params::new(params);
    let display_name = p.patch_name("displayName");
    let avatar_url = p.patch_str("avatarUrl");
    p.finish()?;

    let current = accounts::profile(ctx.conn, &ctx.principal)?;
    let display_name = display_name.apply(current.display_name);
    let avatar_url = avatar_url.apply(current.avatar_url);
    users::update_profile(
        ctx.conn,
        &ctx.principal.user_id,
        display_name.as_deref(),
        avatar_url.as_deref(),
    )?;
    to_json(&accounts::profile(ctx.conn, &ctx.principal)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: AuthedOp = match req.method.as_str() {
        "profile.get" => get,
        "profile.update" => update,
        _ => return None,
    };
    Some(run_authed(state, req, op))
}
