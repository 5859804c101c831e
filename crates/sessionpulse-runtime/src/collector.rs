use crate::clock::{Clock, SystemClock};
use crate::config::MetricsConfig;
use crate::exposition::build_samples;
use crate::operations::OperationTracker;
use crate::sessions::SessionTracker;
use crate::violations::ViolationCounters;
use crate::Result;
use serde_json::Value;
use sessionpulse_engine::aggregate::sessions_in_window;
use sessionpulse_engine::{
    performance_metrics, successful_stateful_percentage, summarize_sessions, validate_performance,
    validate_target, IndicatorClassifier, RegexIndicatorClassifier,
};
use sessionpulse_types::{
    MetricSample, OperationTiming, OperationType, PerformanceMetrics, PerformanceValidation,
    SessionMetricsSummary, SessionOutcome, SessionRecord, SessionSuccessMetrics,
    ToolExecutionRecord, ViolationKind,
};
use std::sync::Arc;

/// Composition-root owned metrics engine.
///
/// Create one at service start and share it (`Arc<MetricsCollector>`) with
/// every call site. There is no global instance.
pub struct MetricsCollector {
    config: MetricsConfig,
    clock: Arc<dyn Clock>,
    violations: Arc<ViolationCounters>,
    sessions: SessionTracker,
    operations: OperationTracker,
}

impl MetricsCollector {
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(SystemClock),
            Arc::new(RegexIndicatorClassifier::default()),
        )
    }

    pub fn with_parts(
        config: MetricsConfig,
        clock: Arc<dyn Clock>,
        classifier: Arc<dyn IndicatorClassifier>,
    ) -> Self {
        let violations = Arc::new(ViolationCounters::default());
        let sessions =
            SessionTracker::new(&config, clock.clone(), classifier, violations.clone());
        let operations = OperationTracker::new(&config, clock.clone(), violations.clone());
        Self {
            config,
            clock,
            violations,
            sessions,
            operations,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn operations(&self) -> &OperationTracker {
        &self.operations
    }

    // --- Write path: agent execution ---

    pub fn start_tracking_session(
        &self,
        session_id: &str,
        trace_id: &str,
        goal: &str,
        max_steps: u32,
    ) -> Result<()> {
        self.sessions
            .start_tracking_session(session_id, trace_id, goal, max_steps)
    }

    pub fn update_session_progress(
        &self,
        session_id: &str,
        execution: ToolExecutionRecord,
    ) -> Result<()> {
        self.sessions.update_session_progress(session_id, execution)
    }

    pub fn record_session_data(&self, session_id: &str, key: &str, value: Value) -> Result<()> {
        self.sessions.record_session_data(session_id, key, value)
    }

    pub fn finalize_session(
        &self,
        session_id: &str,
        explicit_outcome: Option<SessionOutcome>,
    ) -> Result<SessionSuccessMetrics> {
        self.sessions.finalize_session(session_id, explicit_outcome)
    }

    pub fn is_expired(&self, session_id: &str) -> Result<bool> {
        self.sessions.is_expired(session_id)
    }

    pub fn expired_sessions(&self) -> Vec<String> {
        self.sessions.expired_sessions()
    }

    pub fn sweep_expired(&self) -> Vec<SessionSuccessMetrics> {
        self.sessions.sweep_expired()
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.active_session_count()
    }

    pub fn session_snapshot(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.session_snapshot(session_id)
    }

    // --- Write path: operation timing ---

    pub fn start_operation(
        &self,
        operation_id: &str,
        session_id: &str,
        operation_type: OperationType,
    ) -> Result<()> {
        self.operations
            .start_operation(operation_id, session_id, operation_type)
    }

    pub fn record_inference_start(&self, operation_id: &str) -> Result<()> {
        self.operations.record_inference_start(operation_id)
    }

    pub fn record_first_token(&self, operation_id: &str) -> Result<()> {
        self.operations.record_first_token(operation_id)
    }

    pub fn record_inference_end(&self, operation_id: &str) -> Result<()> {
        self.operations.record_inference_end(operation_id)
    }

    pub fn record_dispatch_start(&self, operation_id: &str) -> Result<()> {
        self.operations.record_dispatch_start(operation_id)
    }

    pub fn record_dispatch_end(&self, operation_id: &str) -> Result<()> {
        self.operations.record_dispatch_end(operation_id)
    }

    pub fn record_response_received(&self, operation_id: &str) -> Result<()> {
        self.operations.record_response_received(operation_id)
    }

    pub fn end_operation(&self, operation_id: &str) -> Result<OperationTiming> {
        self.operations.end_operation(operation_id)
    }

    // --- Read path ---

    pub fn get_successful_stateful_sessions_percentage(&self, window_minutes: u32) -> f64 {
        let completed = self.sessions.completed_snapshot();
        let in_window = sessions_in_window(&completed, self.clock.now(), window_minutes);
        successful_stateful_percentage(&in_window)
    }

    pub fn get_session_metrics_summary(&self, window_minutes: u32) -> SessionMetricsSummary {
        let completed = self.sessions.completed_snapshot();
        summarize_sessions(&completed, self.clock.now(), window_minutes)
    }

    pub fn get_performance_metrics(&self, window_minutes: u32) -> PerformanceMetrics {
        let samples = self.sessions.mtba_snapshot();
        let operations = self.operations.recent_snapshot();
        performance_metrics(
            &samples,
            &operations,
            &self.operations.thresholds(),
            self.clock.now(),
            window_minutes,
        )
    }

    /// Compare retained MTBA and TTFT history against configured targets.
    ///
    /// Means are taken over everything still in the bounded histories;
    /// violation counts are lifetime totals.
    pub fn validate_performance_targets(&self) -> PerformanceValidation {
        let mtba_values: Vec<f64> = self
            .sessions
            .mtba_snapshot()
            .iter()
            .map(|s| s.value)
            .collect();
        let ttft_values: Vec<f64> = self
            .operations
            .recent_snapshot()
            .iter()
            .filter_map(|op| op.latencies.ttft)
            .collect();

        validate_performance(
            validate_target(
                self.config.mtba.threshold_seconds,
                &mtba_values,
                self.violations.get(ViolationKind::Mtba),
            ),
            validate_target(
                self.config.latency.ttft_threshold_seconds,
                &ttft_values,
                self.violations.get(ViolationKind::Ttft),
            ),
        )
    }

    pub fn violation_count(&self, kind: ViolationKind) -> u64 {
        self.violations.get(kind)
    }

    /// Current KPIs as flat labeled samples for an exporter to render.
    pub fn metric_samples(&self, window_minutes: u32) -> Vec<MetricSample> {
        build_samples(
            &self.get_session_metrics_summary(window_minutes),
            &self.get_performance_metrics(window_minutes),
            &self.validate_performance_targets(),
            &self.violations,
            self.active_session_count(),
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}
