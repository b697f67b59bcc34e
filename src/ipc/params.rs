use crate::ipc::error::err;
use crate::ipc::types::Request;

/// Param extractors return a ready-made `bad_params` response on failure.
pub type ParamResult<T> = Result<T, serde_json::Value>;

fn bad_params(req: &Request, message: impl Into<String>) -> serde_json::Value {
    err(&req.id, "bad_params", message, None)
}

pub fn roll_no(req: &Request) -> ParamResult<i64> {
    let Some(v) = req.params.get("rollNo") else {
        return Err(bad_params(req, "missing rollNo"));
    };
    v.as_i64()
        .ok_or_else(|| bad_params(req, "rollNo must be an integer"))
}

pub fn marks(req: &Request) -> ParamResult<f64> {
    let Some(v) = req.params.get("marks") else {
        return Err(bad_params(req, "missing marks"));
    };
    v.as_f64()
        .ok_or_else(|| bad_params(req, "marks must be a number"))
}

pub fn string<'a>(req: &'a Request, key: &str) -> ParamResult<&'a str> {
    match req.params.get(key) {
        None => Err(bad_params(req, format!("missing {key}"))),
        Some(v) => v
            .as_str()
            .ok_or_else(|| bad_params(req, format!("{key} must be a string"))),
    }
}
