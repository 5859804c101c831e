use crate::violations::ViolationCounters;
use sessionpulse_types::{
    LatencyStats, MetricSample, PerformanceMetrics, PerformanceValidation, SessionMetricsSummary,
    ViolationKind,
};

// Flattens the report structures into labeled numbers. Text formatting
// (Prometheus or otherwise) belongs to the presentation layer.

const PREFIX: &str = "sessionpulse";

fn name(suffix: &str) -> String {
    format!("{}_{}", PREFIX, suffix)
}

fn latency_samples(metric: &str, stats: &LatencyStats, window: &str) -> Vec<MetricSample> {
    let mut samples = vec![MetricSample::new(name(&format!("{}_seconds_mean", metric)), stats.mean)
        .with_label("window", window)];
    for (quantile, value) in [("0.5", stats.p50), ("0.95", stats.p95), ("0.99", stats.p99)] {
        samples.push(
            MetricSample::new(name(&format!("{}_seconds", metric)), value)
                .with_label("quantile", quantile)
                .with_label("window", window),
        );
    }
    samples.push(
        MetricSample::new(name(&format!("{}_violations", metric)), stats.violations as f64)
            .with_label("window", window),
    );
    samples
}

pub fn build_samples(
    summary: &SessionMetricsSummary,
    performance: &PerformanceMetrics,
    validation: &PerformanceValidation,
    lifetime_violations: &ViolationCounters,
    active_sessions: usize,
) -> Vec<MetricSample> {
    let window = format!("{}m", summary.window_minutes);
    let mut samples = vec![
        MetricSample::new(
            name("successful_stateful_sessions_percentage"),
            summary.successful_stateful_sessions_percentage,
        )
        .with_label("window", window.as_str()),
        MetricSample::new(name("sessions_total"), summary.total_sessions as f64)
            .with_label("window", window.as_str()),
        MetricSample::new(name("active_sessions"), active_sessions as f64),
        MetricSample::new(
            name("session_duration_seconds_mean"),
            summary.average_session_duration,
        )
        .with_label("window", window.as_str()),
        MetricSample::new(name("session_steps_mean"), summary.average_steps_per_session)
            .with_label("window", window.as_str()),
        MetricSample::new(
            name("step_success_rate_mean"),
            summary.average_step_success_rate,
        )
        .with_label("window", window.as_str()),
    ];

    for (outcome, count) in &summary.outcome_distribution {
        samples.push(
            MetricSample::new(name("session_outcomes"), *count as f64)
                .with_label("outcome", outcome.as_str())
                .with_label("window", window.as_str()),
        );
    }
    for (kind, count) in &summary.transaction_type_distribution {
        samples.push(
            MetricSample::new(name("session_transaction_types"), *count as f64)
                .with_label("transaction_type", kind.as_str())
                .with_label("window", window.as_str()),
        );
    }

    let perf_window = format!("{}m", performance.window_minutes);
    samples.extend(latency_samples("mtba", &performance.mtba, &perf_window));
    samples.extend(latency_samples("ttft", &performance.ttft, &perf_window));
    samples.extend(latency_samples(
        "e2e_latency",
        &performance.e2e_latency,
        &perf_window,
    ));
    samples.push(
        MetricSample::new(
            name("throughput_ops_per_second"),
            performance.throughput_ops_per_second,
        )
        .with_label("window", perf_window.as_str()),
    );

    for kind in [
        ViolationKind::Mtba,
        ViolationKind::Ttft,
        ViolationKind::E2eLatency,
    ] {
        samples.push(
            MetricSample::new(
                name("latency_violations_total"),
                lifetime_violations.get(kind) as f64,
            )
            .with_label("kind", kind.as_str()),
        );
    }

    for (kind, check) in [
        ("mtba", &validation.mtba_validation),
        ("ttft", &validation.cognitive_latency_validation),
    ] {
        samples.push(
            MetricSample::new(
                name("target_met"),
                if check.target_met { 1.0 } else { 0.0 },
            )
            .with_label("kind", kind),
        );
    }
    samples.push(MetricSample::new(
        name("performance_valid"),
        if validation.overall_performance_valid {
            1.0
        } else {
            0.0
        },
    ));

    samples
}
