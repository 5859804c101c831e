use crate::mtba::MtbaSample;
use crate::stats::{mean, percentage, percentile_sorted};
use crate::timing::{latency_violations, LatencyThresholds};
use chrono::{DateTime, Duration, Utc};
use sessionpulse_types::{
    LatencyStats, OperationTiming, PerformanceMetrics, SessionMetricsSummary,
    SessionSuccessMetrics, ViolationKind,
};
use std::borrow::Borrow;
use std::collections::BTreeMap;

// Read-path aggregation. Callers snapshot their histories under a lock
// (shared `Arc` handles, not deep copies) and hand them in here, so
// everything below runs without holding one. Inputs are generic over
// `Borrow<T>` so both owned records and `Arc<T>` snapshots are accepted.
// Windows are a linear scan over bounded histories; no index is kept.

/// Earliest start time included in a window of `window_minutes`.
pub fn window_start(now: DateTime<Utc>, window_minutes: u32) -> DateTime<Utc> {
    now - Duration::minutes(window_minutes as i64)
}

pub fn sessions_in_window<S: Borrow<SessionSuccessMetrics>>(
    sessions: &[S],
    now: DateTime<Utc>,
    window_minutes: u32,
) -> Vec<&SessionSuccessMetrics> {
    let cutoff = window_start(now, window_minutes);
    sessions
        .iter()
        .map(|s| <S as Borrow<SessionSuccessMetrics>>::borrow(s))
        .filter(|s| s.start_time >= cutoff)
        .collect()
}

pub fn operations_in_window<O: Borrow<OperationTiming>>(
    operations: &[O],
    now: DateTime<Utc>,
    window_minutes: u32,
) -> Vec<&OperationTiming> {
    let cutoff = window_start(now, window_minutes);
    operations
        .iter()
        .map(|o| <O as Borrow<OperationTiming>>::borrow(o))
        .filter(|o| o.start >= cutoff)
        .collect()
}

/// Headline KPI: share of sessions that succeeded with captured state.
///
/// Always within `[0, 100]`; `0.0` for an empty window.
pub fn successful_stateful_percentage(sessions: &[&SessionSuccessMetrics]) -> f64 {
    let successful = sessions.iter().filter(|s| s.is_successful_stateful()).count();
    percentage(successful, sessions.len())
}

pub fn summarize_sessions<S: Borrow<SessionSuccessMetrics>>(
    sessions: &[S],
    now: DateTime<Utc>,
    window_minutes: u32,
) -> SessionMetricsSummary {
    let in_window = sessions_in_window(sessions, now, window_minutes);

    let durations: Vec<f64> = in_window.iter().map(|s| s.duration_seconds).collect();
    let steps: Vec<f64> = in_window.iter().map(|s| s.total_steps as f64).collect();
    let success_rates: Vec<f64> = in_window.iter().map(|s| s.step_success_rate).collect();
    let completion_rates: Vec<f64> = in_window
        .iter()
        .map(|s| s.transaction_completion_rate)
        .collect();
    let mtbas: Vec<f64> = in_window.iter().filter_map(|s| s.mtba).collect();

    let mut outcome_distribution = BTreeMap::new();
    let mut transaction_type_distribution = BTreeMap::new();
    for session in &in_window {
        *outcome_distribution.entry(session.outcome).or_insert(0) += 1;
        *transaction_type_distribution
            .entry(session.transaction_type)
            .or_insert(0) += 1;
    }

    SessionMetricsSummary {
        window_minutes,
        total_sessions: in_window.len(),
        successful_stateful_sessions: in_window
            .iter()
            .filter(|s| s.is_successful_stateful())
            .count(),
        successful_stateful_sessions_percentage: successful_stateful_percentage(&in_window),
        average_session_duration: mean(&durations),
        average_steps_per_session: mean(&steps),
        average_step_success_rate: mean(&success_rates),
        average_transaction_completion_rate: mean(&completion_rates),
        average_mtba: mean(&mtbas),
        cognitive_latency_violations: in_window.iter().map(|s| s.mtba_violations as u64).sum(),
        outcome_distribution,
        transaction_type_distribution,
    }
}

/// Mean and interpolated p50/p95/p99 of a series.
pub fn latency_stats(values: &[f64], violations: u64) -> LatencyStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    LatencyStats {
        samples: sorted.len(),
        mean: mean(&sorted),
        p50: percentile_sorted(&sorted, 50.0),
        p95: percentile_sorted(&sorted, 95.0),
        p99: percentile_sorted(&sorted, 99.0),
        violations,
    }
}

pub fn performance_metrics<M: Borrow<MtbaSample>, O: Borrow<OperationTiming>>(
    mtba_samples: &[M],
    operations: &[O],
    thresholds: &LatencyThresholds,
    now: DateTime<Utc>,
    window_minutes: u32,
) -> PerformanceMetrics {
    let cutoff = window_start(now, window_minutes);
    let samples: Vec<&MtbaSample> = mtba_samples
        .iter()
        .map(|s| <M as Borrow<MtbaSample>>::borrow(s))
        .filter(|s| s.timestamp >= cutoff)
        .collect();
    let mtba_values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let mtba_violations = samples.iter().filter(|s| s.violated).count() as u64;

    let ops = operations_in_window(operations, now, window_minutes);
    let ttft_values: Vec<f64> = ops.iter().filter_map(|o| o.latencies.ttft).collect();
    let e2e_values: Vec<f64> = ops.iter().filter_map(|o| o.latencies.total).collect();

    let mut ttft_violations = 0u64;
    let mut e2e_violations = 0u64;
    for op in &ops {
        for kind in latency_violations(&op.latencies, thresholds) {
            match kind {
                ViolationKind::Ttft => ttft_violations += 1,
                ViolationKind::E2eLatency => e2e_violations += 1,
                ViolationKind::Mtba => {}
            }
        }
    }

    let window_seconds = window_minutes as f64 * 60.0;
    let throughput_ops_per_second = if window_seconds > 0.0 {
        ops.len() as f64 / window_seconds
    } else {
        0.0
    };

    PerformanceMetrics {
        window_minutes,
        mtba: latency_stats(&mtba_values, mtba_violations),
        ttft: latency_stats(&ttft_values, ttft_violations),
        e2e_latency: latency_stats(&e2e_values, e2e_violations),
        completed_operations: ops.len(),
        throughput_ops_per_second,
    }
}
