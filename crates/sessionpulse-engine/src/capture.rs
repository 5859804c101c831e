use serde_json::Value;
use sessionpulse_types::{SessionRecord, ToolExecutionRecord};

/// Keys whose values are treated as captured session state by default.
pub const DEFAULT_SESSION_DATA_KEYS: &[&str] = &[
    "auth_token",
    "access_token",
    "token",
    "session_id",
    "sessionId",
    "cookie",
    "csrf_token",
    "user_id",
    "order_id",
];

/// Copy well-known stateful values out of a successful JSON object response.
///
/// Only top-level string and number values are captured; later values
/// overwrite earlier ones under the same key. Returns the captured keys.
pub fn capture_session_data(
    record: &mut SessionRecord,
    execution: &ToolExecutionRecord,
    keys: &[String],
) -> Vec<String> {
    if !execution.success {
        return Vec::new();
    }
    let Some(Value::Object(body)) = execution.response.as_json() else {
        return Vec::new();
    };

    let mut captured = Vec::new();
    for key in keys {
        match body.get(key.as_str()) {
            Some(value @ (Value::String(_) | Value::Number(_))) => {
                record.session_data.insert(key.clone(), value.clone());
                captured.push(key.clone());
            }
            _ => {}
        }
    }
    captured
}
