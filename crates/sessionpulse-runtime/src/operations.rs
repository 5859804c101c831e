use crate::clock::Clock;
use crate::config::MetricsConfig;
use crate::violations::ViolationCounters;
use crate::{Error, Result};
use parking_lot::Mutex;
use sessionpulse_engine::timing::record_stage;
use sessionpulse_engine::{complete_operation, latency_violations, BoundedHistory, LatencyThresholds};
use sessionpulse_types::{OperationTiming, OperationType, TimingStage, ViolationKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fresh operation id for callers that have none of their own.
pub fn new_operation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Records sub-stage timestamps for in-flight operations.
///
/// Every recording call is optional; `end_operation` derives whatever
/// latencies the recorded timestamps allow and moves the operation into a
/// bounded history of recent operations.
pub struct OperationTracker {
    clock: Arc<dyn Clock>,
    violations: Arc<ViolationCounters>,
    thresholds: LatencyThresholds,
    active: Mutex<HashMap<String, OperationTiming>>,
    recent: Mutex<BoundedHistory<Arc<OperationTiming>>>,
}

impl OperationTracker {
    pub fn new(
        config: &MetricsConfig,
        clock: Arc<dyn Clock>,
        violations: Arc<ViolationCounters>,
    ) -> Self {
        Self {
            clock,
            violations,
            thresholds: config.latency_thresholds(),
            active: Mutex::new(HashMap::new()),
            recent: Mutex::new(BoundedHistory::new(
                config.latency.operation_history_capacity,
            )),
        }
    }

    pub fn start_operation(
        &self,
        operation_id: &str,
        session_id: &str,
        operation_type: OperationType,
    ) -> Result<()> {
        let timing = OperationTiming::new(
            operation_id,
            session_id,
            operation_type,
            self.clock.now(),
        );

        let mut active = self.active.lock();
        if active.contains_key(operation_id) {
            warn!(operation_id, "operation already active");
            return Err(Error::OperationAlreadyActive(operation_id.to_string()));
        }
        debug!(
            operation_id,
            session_id,
            operation_type = timing.operation_type.as_str(),
            "operation started"
        );
        active.insert(operation_id.to_string(), timing);
        Ok(())
    }

    /// Stamp `stage` with the current time.
    pub fn record_stage(&self, operation_id: &str, stage: TimingStage) -> Result<()> {
        let now = self.clock.now();
        let mut active = self.active.lock();
        let Some(timing) = active.get_mut(operation_id) else {
            warn!(operation_id, stage = stage.as_str(), "timing for unknown operation");
            return Err(Error::OperationNotFound(operation_id.to_string()));
        };
        record_stage(timing, stage, now);
        Ok(())
    }

    pub fn record_inference_start(&self, operation_id: &str) -> Result<()> {
        self.record_stage(operation_id, TimingStage::InferenceStart)
    }

    /// Time-to-first-token mark; pairs with `record_inference_start`.
    pub fn record_first_token(&self, operation_id: &str) -> Result<()> {
        self.record_stage(operation_id, TimingStage::FirstToken)
    }

    pub fn record_inference_end(&self, operation_id: &str) -> Result<()> {
        self.record_stage(operation_id, TimingStage::InferenceEnd)
    }

    pub fn record_dispatch_start(&self, operation_id: &str) -> Result<()> {
        self.record_stage(operation_id, TimingStage::DispatchStart)
    }

    pub fn record_dispatch_end(&self, operation_id: &str) -> Result<()> {
        self.record_stage(operation_id, TimingStage::DispatchEnd)
    }

    pub fn record_response_received(&self, operation_id: &str) -> Result<()> {
        self.record_stage(operation_id, TimingStage::ResponseReceived)
    }

    pub fn end_operation(&self, operation_id: &str) -> Result<OperationTiming> {
        let now = self.clock.now();
        let timing = self.active.lock().remove(operation_id);
        let Some(mut timing) = timing else {
            warn!(operation_id, "end for unknown operation");
            return Err(Error::OperationNotFound(operation_id.to_string()));
        };

        complete_operation(&mut timing, now);
        for kind in latency_violations(&timing.latencies, &self.thresholds) {
            self.violations.increment(kind);
            warn!(
                operation_id,
                session_id = timing.session_id.as_str(),
                violation = kind.as_str(),
                total = ?timing.latencies.total,
                ttft = ?timing.latencies.ttft,
                "latency threshold exceeded"
            );
        }
        debug!(operation_id, total = ?timing.latencies.total, "operation ended");

        let shared = Arc::new(timing.clone());
        self.recent.lock().push(shared);
        Ok(timing)
    }

    pub fn active_operation_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Shared handles to recently ended operations, oldest first.
    pub fn recent_snapshot(&self) -> Vec<Arc<OperationTiming>> {
        self.recent.lock().snapshot()
    }

    pub fn thresholds(&self) -> LatencyThresholds {
        self.thresholds
    }

    pub fn violation_count(&self, kind: ViolationKind) -> u64 {
        self.violations.get(kind)
    }
}
