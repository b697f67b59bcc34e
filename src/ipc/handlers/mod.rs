pub mod auth;
pub mod backup;
pub mod core;
pub mod stats;
pub mod students;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request, Workspace};

/// The open workspace, or a `no_workspace` response.
pub(crate) fn workspace<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Workspace, serde_json::Value> {
    state
        .workspace
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// The open workspace, provided someone is logged in.
pub(crate) fn authed<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Workspace, serde_json::Value> {
    let ws = workspace(state, req)?;
    if !state.session.is_logged_in() {
        return Err(err(&req.id, "not_authenticated", "log in first", None));
    }
    Ok(ws)
}
