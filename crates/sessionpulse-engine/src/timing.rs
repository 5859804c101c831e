use chrono::{DateTime, Utc};
use sessionpulse_types::{OperationTiming, StageLatencies, TimingStage, ViolationKind};

pub const DEFAULT_TTFT_THRESHOLD_SECONDS: f64 = 2.0;
pub const DEFAULT_E2E_THRESHOLD_SECONDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyThresholds {
    pub ttft_seconds: f64,
    pub e2e_seconds: f64,
}

impl Default for LatencyThresholds {
    fn default() -> Self {
        Self {
            ttft_seconds: DEFAULT_TTFT_THRESHOLD_SECONDS,
            e2e_seconds: DEFAULT_E2E_THRESHOLD_SECONDS,
        }
    }
}

fn seconds_between(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<f64> {
    match (from, to) {
        (Some(from), Some(to)) => Some((to - from).num_microseconds()? as f64 / 1_000_000.0),
        _ => None,
    }
}

/// Store `at` in the slot for `stage`; a repeated call overwrites.
pub fn record_stage(timing: &mut OperationTiming, stage: TimingStage, at: DateTime<Utc>) {
    let slot = match stage {
        TimingStage::InferenceStart => &mut timing.inference_start,
        TimingStage::FirstToken => &mut timing.first_token,
        TimingStage::InferenceEnd => &mut timing.inference_end,
        TimingStage::DispatchStart => &mut timing.dispatch_start,
        TimingStage::DispatchEnd => &mut timing.dispatch_end,
        TimingStage::ResponseReceived => &mut timing.response_received,
    };
    *slot = Some(at);
}

/// Derive stage latencies from the pairs of timestamps that are both present.
///
/// Nothing is interpolated: a missing endpoint leaves the latency `None`.
pub fn derive_latencies(timing: &OperationTiming) -> StageLatencies {
    StageLatencies {
        total: seconds_between(Some(timing.start), timing.end),
        inference: seconds_between(timing.inference_start, timing.inference_end),
        ttft: seconds_between(timing.inference_start, timing.first_token),
        dispatch: seconds_between(timing.dispatch_start, timing.dispatch_end),
        downstream: seconds_between(timing.dispatch_start, timing.response_received),
    }
}

/// Close an operation at `end` and fill in its derived latencies.
pub fn complete_operation(timing: &mut OperationTiming, end: DateTime<Utc>) {
    timing.end = Some(end);
    timing.latencies = derive_latencies(timing);
}

/// Threshold checks performed when an operation ends.
pub fn latency_violations(
    latencies: &StageLatencies,
    thresholds: &LatencyThresholds,
) -> Vec<ViolationKind> {
    let mut violations = Vec::new();
    if latencies.ttft.is_some_and(|ttft| ttft > thresholds.ttft_seconds) {
        violations.push(ViolationKind::Ttft);
    }
    if latencies
        .total
        .is_some_and(|total| total > thresholds.e2e_seconds)
    {
        violations.push(ViolationKind::E2eLatency);
    }
    violations
}
