use crate::ipc::error::{ok, store_err};
use crate::ipc::handlers::authed;
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match ws.store.list_all() {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    let roll_no = match params::roll_no(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.store.find(roll_no) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_exists(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    let roll_no = match params::roll_no(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.store.exists(roll_no) {
        Ok(exists) => ok(&req.id, json!({ "exists": exists })),
        Err(e) => store_err(&req.id, &e),
    }
}

/// Shared by create and update: both take the full record.
fn record_params(req: &Request) -> Result<(i64, &str, f64), serde_json::Value> {
    let roll_no = params::roll_no(req)?;
    let name = params::string(req, "name")?;
    let marks = params::marks(req)?;
    Ok((roll_no, name, marks))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    let (roll_no, name, marks) = match record_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.store.add(roll_no, name, marks) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    let (roll_no, name, marks) = match record_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.store.update(roll_no, name, marks) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    let roll_no = match params::roll_no(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ws.store.delete(roll_no) {
        Ok(()) => ok(&req.id, json!({ "rollNo": roll_no })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.get" => Some(handle_get(state, req)),
        "students.exists" => Some(handle_exists(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.update" => Some(handle_update(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
