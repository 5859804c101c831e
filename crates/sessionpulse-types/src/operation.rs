use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of logical action being timed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    AgentAction,
    Inference,
    ApiDispatch,
    ToolCall,
    Other(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::AgentAction => "agent_action",
            OperationType::Inference => "inference",
            OperationType::ApiDispatch => "api_dispatch",
            OperationType::ToolCall => "tool_call",
            OperationType::Other(name) => name,
        }
    }
}

impl From<&str> for OperationType {
    fn from(value: &str) -> Self {
        match value {
            "agent_action" => OperationType::AgentAction,
            "inference" => OperationType::Inference,
            "api_dispatch" => OperationType::ApiDispatch,
            "tool_call" => OperationType::ToolCall,
            other => OperationType::Other(other.to_string()),
        }
    }
}

/// Stage latencies derived when an operation ends, in seconds.
///
/// A field is `None` unless both timestamps it is computed from were recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageLatencies {
    pub total: Option<f64>,
    pub inference: Option<f64>,
    pub ttft: Option<f64>,
    pub dispatch: Option<f64>,
    pub downstream: Option<f64>,
}

/// Sub-stage timestamps for one logical action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationTiming {
    pub operation_id: String,
    pub session_id: String,
    pub operation_type: OperationType,
    pub start: DateTime<Utc>,
    pub inference_start: Option<DateTime<Utc>>,
    pub first_token: Option<DateTime<Utc>>,
    pub inference_end: Option<DateTime<Utc>>,
    pub dispatch_start: Option<DateTime<Utc>>,
    pub dispatch_end: Option<DateTime<Utc>>,
    pub response_received: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub latencies: StageLatencies,
}

impl OperationTiming {
    pub fn new(
        operation_id: impl Into<String>,
        session_id: impl Into<String>,
        operation_type: OperationType,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            session_id: session_id.into(),
            operation_type,
            start,
            inference_start: None,
            first_token: None,
            inference_end: None,
            dispatch_start: None,
            dispatch_end: None,
            response_received: None,
            end: None,
            latencies: StageLatencies::default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.end.is_some()
    }
}

/// Which operation stage a timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStage {
    InferenceStart,
    FirstToken,
    InferenceEnd,
    DispatchStart,
    DispatchEnd,
    ResponseReceived,
}

impl TimingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingStage::InferenceStart => "inference_start",
            TimingStage::FirstToken => "first_token",
            TimingStage::InferenceEnd => "inference_end",
            TimingStage::DispatchStart => "dispatch_start",
            TimingStage::DispatchEnd => "dispatch_end",
            TimingStage::ResponseReceived => "response_received",
        }
    }
}

/// Labels attached to latency threshold violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Mtba,
    Ttft,
    E2eLatency,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Mtba => "mtba",
            ViolationKind::Ttft => "ttft",
            ViolationKind::E2eLatency => "e2e_latency",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_round_trips_known_names() {
        for name in ["agent_action", "inference", "api_dispatch", "tool_call"] {
            assert_eq!(OperationType::from(name).as_str(), name);
        }
        assert_eq!(
            OperationType::from("warmup"),
            OperationType::Other("warmup".to_string())
        );
    }

    #[test]
    fn test_new_operation_has_no_derived_latencies() {
        let op = OperationTiming::new("op-1", "s1", OperationType::ToolCall, Utc::now());
        assert!(!op.is_complete());
        assert_eq!(op.latencies, StageLatencies::default());
    }
}
