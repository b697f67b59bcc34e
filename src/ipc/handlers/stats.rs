use crate::ipc::error::{ok, store_err};
use crate::ipc::handlers::authed;
use crate::ipc::types::{AppState, Request};
use crate::store::{RecordStore, StoreError};
use serde_json::json;

fn handle_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match ws.store.average_marks() {
        Ok(average) => ok(&req.id, json!({ "average": average })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_topper(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match ws.store.topper() {
        Ok(topper) => ok(&req.id, json!({ "topper": topper })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn summary(store: &RecordStore) -> Result<serde_json::Value, StoreError> {
    let grade_counts: serde_json::Map<String, serde_json::Value> = store
        .grade_counts()?
        .into_iter()
        .map(|(g, n)| (g.as_str().to_string(), json!(n)))
        .collect();
    Ok(json!({
        "count": store.count()?,
        "average": store.average_marks()?,
        "topper": store.topper()?,
        "gradeCounts": grade_counts,
    }))
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match authed(state, req) {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match summary(&ws.store) {
        Ok(result) => ok(&req.id, result),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.average" => Some(handle_average(state, req)),
        "stats.topper" => Some(handle_topper(state, req)),
        "stats.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
