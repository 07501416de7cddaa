use crate::router::HandlerResponse;
use may_minihttp::Response;
use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Write a handler's response: string bodies as `text/plain`, everything else as JSON.
pub fn write_handler_response(res: &mut Response, response: HandlerResponse) {
    let reason = status_reason(response.status);
    res.status_code(response.status as usize, reason);
    match response.body {
        Value::String(s) => {
            res.header("Content-Type: text/plain; charset=utf-8");
            res.body_vec(s.into_bytes());
        }
        other => {
            res.header("Content-Type: application/json");
            res.body_vec(serde_json::to_vec(&other).unwrap_or_default());
        }
    }
}

pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    let reason = status_reason(status);
    res.status_code(status as usize, reason);
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
