//! Fixtures for tool executions and canned agent runs.
//!
//! Provides utilities to:
//! - Build `ToolExecutionRecord`s with sensible defaults
//! - Generate the response sequences of typical successful and failing runs

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use sessionpulse_types::{ResponsePayload, ToolExecutionRecord};

/// Fixed instant used when a builder is not given an explicit timestamp.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

/// Start building a successful call to `tool_name` with an empty response.
pub fn tool_call(tool_name: &str) -> ExecutionBuilder {
    ExecutionBuilder::new(tool_name)
}

/// Builder for `ToolExecutionRecord`.
///
/// # Example
/// ```
/// use sessionpulse_testing::tool_call;
/// use serde_json::json;
///
/// let exec = tool_call("post_login")
///     .json(json!({"message": "Login successful"}))
///     .build();
/// assert!(exec.success);
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionBuilder {
    tool_name: String,
    parameters: Value,
    response: ResponsePayload,
    duration_ms: u64,
    success: bool,
    error_message: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl ExecutionBuilder {
    pub fn new(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            parameters: Value::Null,
            response: ResponsePayload::Empty,
            duration_ms: 100,
            success: true,
            error_message: None,
            timestamp: None,
        }
    }

    pub fn params(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.response = ResponsePayload::Json(body);
        self
    }

    pub fn text(mut self, body: &str) -> Self {
        self.response = ResponsePayload::Text(body.to_string());
        self
    }

    pub fn opaque(mut self, bytes: &[u8]) -> Self {
        self.response = ResponsePayload::Opaque(bytes.to_vec());
        self
    }

    /// Mark the call failed with the given error message.
    pub fn failed(mut self, message: &str) -> Self {
        self.success = false;
        self.error_message = Some(message.to_string());
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp with `timestamp` unless one was already set.
    pub fn at_or(self, timestamp: DateTime<Utc>) -> Self {
        match self.timestamp {
            Some(_) => self,
            None => self.at(timestamp),
        }
    }

    pub fn build(self) -> ToolExecutionRecord {
        ToolExecutionRecord {
            tool_name: self.tool_name,
            parameters: self.parameters,
            response: self.response,
            duration_ms: self.duration_ms,
            success: self.success,
            error_message: self.error_message,
            timestamp: self.timestamp.unwrap_or_else(base_time),
        }
    }
}

/// Login, profile fetch, logout; every step succeeds and a token is issued.
pub fn successful_login_run() -> Vec<ExecutionBuilder> {
    vec![
        tool_call("post_login").json(json!({"message": "Login successful", "auth_token": "x"})),
        tool_call("get_profile").json(json!({"user": "alice", "status": "active"})),
        tool_call("post_logout").json(json!({"message": "bye"})),
    ]
}

/// Three rejected login attempts.
pub fn rejected_login_run() -> Vec<ExecutionBuilder> {
    (0..3)
        .map(|_| {
            tool_call("post_login")
                .json(json!({"detail": "Unauthorized"}))
                .failed("401 Unauthorized")
        })
        .collect()
}

/// `steps` successful searches that never complete a purchase.
pub fn endless_search_run(steps: usize) -> Vec<ExecutionBuilder> {
    (0..steps)
        .map(|i| tool_call("search").json(json!({"page": i, "result": "retrieved"})))
        .collect()
}
