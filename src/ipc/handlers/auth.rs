use crate::ipc::error::{err, ok, store_err};
use crate::ipc::handlers::workspace;
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::json;
use tracing::info;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let gate = match workspace(state, req) {
        Ok(ws) => ws.gate.clone(),
        Err(resp) => return resp,
    };
    let username = match params::string(req, "username") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let password = match params::string(req, "password") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    if username.is_empty() || password.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "username and password are required",
            None,
        );
    }

    match state.session.login(&gate, username, password) {
        Ok(Some(session_id)) => {
            info!(username, "logged in");
            ok(
                &req.id,
                json!({ "sessionId": session_id.to_string(), "username": username }),
            )
        }
        Ok(None) => {
            info!(username, "login rejected");
            err(
                &req.id,
                "invalid_credentials",
                "invalid username or password",
                None,
            )
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was = state.session.logout();
    if was {
        info!("logged out");
    }
    ok(&req.id, json!({ "loggedOut": was }))
}

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    match &state.session {
        Session::LoggedOut => ok(&req.id, json!({ "loggedIn": false })),
        Session::LoggedIn {
            session_id,
            username,
            since,
        } => ok(
            &req.id,
            json!({
                "loggedIn": true,
                "sessionId": session_id.to_string(),
                "username": username,
                "since": since.to_rfc3339(),
            }),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.status" => Some(handle_status(state, req)),
        _ => None,
    }
}
