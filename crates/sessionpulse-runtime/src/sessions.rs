use crate::clock::Clock;
use crate::config::MetricsConfig;
use crate::violations::ViolationCounters;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde_json::Value;
use sessionpulse_engine::resolver::is_expired;
use sessionpulse_engine::{
    apply_indicators, capture_session_data, classify_goal, extract_indicators, finalize_record,
    record_action, BoundedHistory, IndicatorClassifier, MtbaPolicy, MtbaSample, ResolverPolicy,
};
use sessionpulse_types::{
    SessionOutcome, SessionRecord, SessionSuccessMetrics, ToolExecutionRecord, ViolationKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

// NOTE: Locking
//
// Each store has its own mutex and no method ever holds two at once.
// Regex extraction runs before the active-session lock is taken, and read
// paths clone the histories under the lock and filter after releasing it,
// so lock hold time does not grow with window size or payload size.

/// Owns the active-session map and the bounded histories derived from it.
pub struct SessionTracker {
    clock: Arc<dyn Clock>,
    classifier: Arc<dyn IndicatorClassifier>,
    violations: Arc<ViolationCounters>,
    default_max_steps: u32,
    session_data_keys: Vec<String>,
    resolver: ResolverPolicy,
    mtba: MtbaPolicy,
    active: Mutex<HashMap<String, SessionRecord>>,
    completed: Mutex<BoundedHistory<Arc<SessionSuccessMetrics>>>,
    mtba_history: Mutex<BoundedHistory<Arc<MtbaSample>>>,
}

impl SessionTracker {
    pub fn new(
        config: &MetricsConfig,
        clock: Arc<dyn Clock>,
        classifier: Arc<dyn IndicatorClassifier>,
        violations: Arc<ViolationCounters>,
    ) -> Self {
        Self {
            clock,
            classifier,
            violations,
            default_max_steps: config.sessions.max_steps,
            session_data_keys: config.indicators.session_data_keys.clone(),
            resolver: config.resolver_policy(),
            mtba: config.mtba_policy(),
            active: Mutex::new(HashMap::new()),
            completed: Mutex::new(BoundedHistory::new(config.sessions.history_capacity)),
            mtba_history: Mutex::new(BoundedHistory::new(config.mtba.history_capacity)),
        }
    }

    /// Begin tracking a session. `max_steps == 0` selects the configured default.
    pub fn start_tracking_session(
        &self,
        session_id: &str,
        trace_id: &str,
        goal: &str,
        max_steps: u32,
    ) -> Result<()> {
        let max_steps = if max_steps == 0 {
            self.default_max_steps
        } else {
            max_steps
        };
        let transaction_type = classify_goal(goal);
        let record = SessionRecord::new(
            session_id,
            trace_id,
            goal,
            transaction_type,
            max_steps,
            self.clock.now(),
        );

        let mut active = self.active.lock();
        if active.contains_key(session_id) {
            warn!(session_id, "session already active");
            return Err(Error::SessionAlreadyActive(session_id.to_string()));
        }
        active.insert(session_id.to_string(), record);
        drop(active);

        debug!(session_id, trace_id, %transaction_type, max_steps, "session tracking started");
        Ok(())
    }

    /// Append one completed action to a session.
    ///
    /// Tags indicators, captures session data, bumps the step counter, and
    /// feeds the action timestamp into the session's trailing MTBA window.
    pub fn update_session_progress(
        &self,
        session_id: &str,
        execution: ToolExecutionRecord,
    ) -> Result<()> {
        let indicators = extract_indicators(self.classifier.as_ref(), &execution);

        let (step, sample) = {
            let mut active = self.active.lock();
            let Some(record) = active.get_mut(session_id) else {
                warn!(session_id, "progress update for unknown session");
                return Err(Error::SessionNotFound(session_id.to_string()));
            };

            apply_indicators(record, indicators);
            capture_session_data(record, &execution, &self.session_data_keys);
            let sample = record_action(record, execution.timestamp, &self.mtba);
            record.executions.push(execution);
            record.current_step += 1;
            (record.current_step, sample)
        };

        debug!(session_id, step, "session progress recorded");

        if let Some(sample) = sample {
            if sample.violated {
                self.violations.increment(ViolationKind::Mtba);
                warn!(
                    session_id,
                    mtba = sample.value,
                    threshold = self.mtba.threshold_seconds,
                    "MTBA above threshold"
                );
            }
            let sample = Arc::new(sample);
            self.mtba_history.lock().push(sample);
        }
        Ok(())
    }

    /// Attach captured state (token, cookie, id) to a session explicitly.
    pub fn record_session_data(&self, session_id: &str, key: &str, value: Value) -> Result<()> {
        let mut active = self.active.lock();
        let Some(record) = active.get_mut(session_id) else {
            warn!(session_id, key, "session data for unknown session");
            return Err(Error::SessionNotFound(session_id.to_string()));
        };
        record.session_data.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a session from the active set and freeze its metrics.
    ///
    /// Without an explicit outcome the resolver decides. Unknown ids are an
    /// error: the caller finalized twice or never started the session.
    pub fn finalize_session(
        &self,
        session_id: &str,
        explicit_outcome: Option<SessionOutcome>,
    ) -> Result<SessionSuccessMetrics> {
        let record = self.active.lock().remove(session_id);
        let Some(record) = record else {
            warn!(session_id, "finalize for unknown session");
            return Err(Error::SessionNotFound(session_id.to_string()));
        };

        let metrics = finalize_record(&record, explicit_outcome, self.clock.now(), &self.resolver);
        info!(
            session_id,
            outcome = %metrics.outcome,
            steps = metrics.total_steps,
            stateful = metrics.has_session_data,
            duration_seconds = metrics.duration_seconds,
            "session finalized"
        );

        let shared = Arc::new(metrics.clone());
        self.completed.lock().push(shared);
        Ok(metrics)
    }

    /// Lazily evaluate whether an active session is past its timeout.
    pub fn is_expired(&self, session_id: &str) -> Result<bool> {
        let now = self.clock.now();
        let active = self.active.lock();
        active
            .get(session_id)
            .map(|record| is_expired(record, now, &self.resolver))
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    pub fn expired_sessions(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut ids: Vec<String> = self
            .active
            .lock()
            .values()
            .filter(|record| is_expired(record, now, &self.resolver))
            .map(|record| record.session_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Finalize every expired session. Only runs when a caller invokes it.
    pub fn sweep_expired(&self) -> Vec<SessionSuccessMetrics> {
        let swept: Vec<SessionSuccessMetrics> = self
            .expired_sessions()
            .into_iter()
            .filter_map(|id| match self.finalize_session(&id, None) {
                Ok(metrics) => Some(metrics),
                Err(err) => {
                    // finalized concurrently between listing and sweeping
                    debug!(
                        session_id = id.as_str(),
                        error = %err,
                        "expired session skipped by sweep"
                    );
                    None
                }
            })
            .collect();
        if !swept.is_empty() {
            info!(count = swept.len(), "expired sessions swept");
        }
        swept
    }

    pub fn active_session_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Copy of an active session's current state.
    pub fn session_snapshot(&self, session_id: &str) -> Option<SessionRecord> {
        self.active.lock().get(session_id).cloned()
    }

    /// Shared handles to the finalized sessions, oldest first.
    pub fn completed_snapshot(&self) -> Vec<Arc<SessionSuccessMetrics>> {
        self.completed.lock().snapshot()
    }

    pub fn mtba_snapshot(&self) -> Vec<Arc<MtbaSample>> {
        self.mtba_history.lock().snapshot()
    }

    pub fn mtba_violations(&self) -> u64 {
        self.violations.get(ViolationKind::Mtba)
    }
}
