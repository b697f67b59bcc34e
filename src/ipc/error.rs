use serde_json::json;
use tracing::warn;

use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Expected outcomes (duplicate, missing, invalid) carry the roll number in
/// `details`; storage failures are logged.
pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    let details = match e {
        StoreError::DuplicateKey { roll_no } | StoreError::NotFound { roll_no } => {
            Some(json!({ "rollNo": roll_no }))
        }
        StoreError::Validation(_) => None,
        StoreError::Storage(_) | StoreError::Io(_) => {
            warn!(error = %e, "storage failure");
            None
        }
    };
    err(id, e.code(), e.to_string(), details)
}
