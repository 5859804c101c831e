use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Coarse classification of a session goal.
///
/// Selects the expected-completion indicator set for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    LoginFlow,
    PurchaseFlow,
    RegistrationFlow,
    DataRetrieval,
    FormSubmission,
    MultiStepWorkflow,
    Generic,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::LoginFlow => "login_flow",
            TransactionType::PurchaseFlow => "purchase_flow",
            TransactionType::RegistrationFlow => "registration_flow",
            TransactionType::DataRetrieval => "data_retrieval",
            TransactionType::FormSubmission => "form_submission",
            TransactionType::MultiStepWorkflow => "multi_step_workflow",
            TransactionType::Generic => "generic",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a tracked session.
///
/// A session is implicitly `Active` while it sits in the tracker; every
/// variant here is terminal and assigned exactly once at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Success,
    Failure,
    Timeout,
    MaxStepsReached,
    Error,
    Abandoned,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Success => "success",
            SessionOutcome::Failure => "failure",
            SessionOutcome::Timeout => "timeout",
            SessionOutcome::MaxStepsReached => "max_steps_reached",
            SessionOutcome::Error => "error",
            SessionOutcome::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body returned to the agent by the target API.
///
/// The payload is opaque to the engine: it is only ever rendered to text
/// for pattern scanning, and rendering never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ResponsePayload {
    Json(Value),
    Text(String),
    Opaque(Vec<u8>),
    Empty,
}

impl ResponsePayload {
    /// Render the payload as scan-able text.
    ///
    /// Opaque bytes are decoded lossily, so invalid UTF-8 degrades to
    /// replacement characters instead of an error.
    pub fn to_text(&self) -> String {
        match self {
            ResponsePayload::Json(Value::String(s)) => s.clone(),
            ResponsePayload::Json(value) => value.to_string(),
            ResponsePayload::Text(text) => text.clone(),
            ResponsePayload::Opaque(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            ResponsePayload::Empty => String::new(),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponsePayload::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for ResponsePayload {
    fn from(value: Value) -> Self {
        ResponsePayload::Json(value)
    }
}

impl From<String> for ResponsePayload {
    fn from(text: String) -> Self {
        ResponsePayload::Text(text)
    }
}

impl From<&str> for ResponsePayload {
    fn from(text: &str) -> Self {
        ResponsePayload::Text(text.to_string())
    }
}

/// One completed tool call made by the agent against the target API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    pub tool_name: String,
    pub parameters: Value,
    pub response: ResponsePayload,
    /// Wall time spent executing the call, in milliseconds.
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the action happened; drives MTBA and must be causal per session.
    pub timestamp: DateTime<Utc>,
}

/// Live, mutable state of one in-flight session.
///
/// Owned by the session tracker between `start_tracking_session` and
/// `finalize_session`. All fields exist from construction.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub trace_id: String,
    pub goal: String,
    pub transaction_type: TransactionType,
    pub start_time: DateTime<Utc>,
    pub max_steps: u32,
    pub current_step: u32,
    pub session_data: BTreeMap<String, Value>,
    pub executions: Vec<ToolExecutionRecord>,
    pub success_indicators: BTreeSet<String>,
    pub failure_indicators: BTreeSet<String>,
    /// Most recent action timestamps, oldest first, capped at the MTBA window size.
    pub action_timestamps: Vec<DateTime<Utc>>,
    pub current_mtba: Option<f64>,
    pub mtba_violations: u32,
}

impl SessionRecord {
    pub fn new(
        session_id: impl Into<String>,
        trace_id: impl Into<String>,
        goal: impl Into<String>,
        transaction_type: TransactionType,
        max_steps: u32,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            trace_id: trace_id.into(),
            goal: goal.into(),
            transaction_type,
            start_time,
            max_steps,
            current_step: 0,
            session_data: BTreeMap::new(),
            executions: Vec::new(),
            success_indicators: BTreeSet::new(),
            failure_indicators: BTreeSet::new(),
            action_timestamps: Vec::new(),
            current_mtba: None,
            mtba_violations: 0,
        }
    }

    pub fn has_session_data(&self) -> bool {
        !self.session_data.is_empty()
    }

    pub fn successful_steps(&self) -> usize {
        self.executions.iter().filter(|e| e.success).count()
    }

    pub fn failed_steps(&self) -> usize {
        self.executions.len() - self.successful_steps()
    }

    /// Fraction of executions that succeeded, `0.0` when nothing ran.
    pub fn step_success_rate(&self) -> f64 {
        if self.executions.is_empty() {
            return 0.0;
        }
        self.successful_steps() as f64 / self.executions.len() as f64
    }

    /// Distinct error messages in the order they first appeared.
    pub fn error_summary(&self) -> Vec<String> {
        let mut errors: Vec<String> = Vec::new();
        for message in self.executions.iter().filter_map(|e| e.error_message.as_ref()) {
            if !errors.iter().any(|m| m == message) {
                errors.push(message.clone());
            }
        }
        errors
    }

    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// Immutable snapshot produced exactly once when a session is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSuccessMetrics {
    pub session_id: String,
    pub trace_id: String,
    pub goal: String,
    pub transaction_type: TransactionType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub outcome: SessionOutcome,
    pub duration_seconds: f64,
    pub total_steps: u32,
    pub successful_steps: u32,
    pub failed_steps: u32,
    pub step_success_rate: f64,
    pub transactions_completed: u32,
    pub transactions_expected: u32,
    pub transaction_completion_rate: f64,
    pub has_session_data: bool,
    pub session_data_keys: Vec<String>,
    pub error_summary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtba: Option<f64>,
    pub mtba_violations: u32,
    pub success_indicators: Vec<String>,
    pub failure_indicators: Vec<String>,
}

impl SessionSuccessMetrics {
    /// SUCCESS outcome backed by at least one captured piece of session state.
    pub fn is_successful_stateful(&self) -> bool {
        self.outcome == SessionOutcome::Success && self.has_session_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn execution(success: bool, error: Option<&str>) -> ToolExecutionRecord {
        ToolExecutionRecord {
            tool_name: "http_request".to_string(),
            parameters: json!({}),
            response: ResponsePayload::Empty,
            duration_ms: 10,
            success,
            error_message: error.map(str::to_string),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_opaque_payload_degrades_to_lossy_text() {
        let payload = ResponsePayload::Opaque(vec![b'o', b'k', 0xff]);
        assert_eq!(payload.to_text(), "ok\u{fffd}");
    }

    #[test]
    fn test_json_string_payload_is_not_quoted() {
        let payload = ResponsePayload::Json(json!("login success"));
        assert_eq!(payload.to_text(), "login success");
    }

    #[test]
    fn test_step_rates_on_empty_record() {
        let record = SessionRecord::new(
            "s1",
            "t1",
            "goal",
            TransactionType::Generic,
            50,
            Utc::now(),
        );
        assert_eq!(record.step_success_rate(), 0.0);
        assert_eq!(record.failed_steps(), 0);
        assert!(!record.has_session_data());
    }

    #[test]
    fn test_error_summary_is_deduplicated_in_order() {
        let mut record = SessionRecord::new(
            "s1",
            "t1",
            "goal",
            TransactionType::Generic,
            50,
            Utc::now(),
        );
        record.executions.push(execution(false, Some("timeout")));
        record.executions.push(execution(true, None));
        record.executions.push(execution(false, Some("bad request")));
        record.executions.push(execution(false, Some("timeout")));

        assert_eq!(record.error_summary(), vec!["timeout", "bad request"]);
        assert_eq!(record.successful_steps(), 1);
        assert_eq!(record.failed_steps(), 3);
    }
}
