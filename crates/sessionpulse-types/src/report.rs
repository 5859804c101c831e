use crate::{SessionOutcome, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view over the sessions that started inside a time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetricsSummary {
    pub window_minutes: u32,
    pub total_sessions: usize,
    pub successful_stateful_sessions: usize,
    pub successful_stateful_sessions_percentage: f64,
    pub average_session_duration: f64,
    pub average_steps_per_session: f64,
    pub average_step_success_rate: f64,
    pub average_transaction_completion_rate: f64,
    pub average_mtba: f64,
    pub cognitive_latency_violations: u64,
    pub outcome_distribution: BTreeMap<SessionOutcome, usize>,
    pub transaction_type_distribution: BTreeMap<TransactionType, usize>,
}

/// Distribution of one latency series, in seconds.
///
/// All fields are `0.0` when the series is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub samples: usize,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub violations: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub window_minutes: u32,
    pub mtba: LatencyStats,
    pub ttft: LatencyStats,
    pub e2e_latency: LatencyStats,
    pub completed_operations: usize,
    pub throughput_ops_per_second: f64,
}

/// Result of comparing one metric against its configured target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetValidation {
    pub target: f64,
    pub current_mean: f64,
    pub target_met: bool,
    pub violation_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceValidation {
    pub mtba_validation: TargetValidation,
    pub cognitive_latency_validation: TargetValidation,
    pub overall_performance_valid: bool,
}

/// One labeled numeric value for the exposition layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            value,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
