use crate::completion::count_completed_transactions;
use chrono::{DateTime, Utc};
use sessionpulse_types::{SessionOutcome, SessionRecord, SessionSuccessMetrics};

// NOTE: Outcome resolution
//
// Success rate alone misclassifies agents that complete many trivial reads
// without ever establishing session state. SUCCESS therefore also needs
// corroborating evidence (captured session data or success indicators) and
// must not be dominated by failure indicators.
//
// Termination reasons are checked first, in a fixed priority order, so a
// session that timed out is TIMEOUT even if every step succeeded.

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 300.0;
pub const MIN_SUCCESSFUL_STEPS: usize = 2;
pub const MIN_SUCCESS_RATE: f64 = 0.7;

/// Substrings in an error message that mark the session as errored.
const CRITICAL_MARKERS: &[&str] = &["fatal", "critical", "abort"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverPolicy {
    pub timeout_seconds: f64,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

pub fn is_expired(record: &SessionRecord, now: DateTime<Utc>, policy: &ResolverPolicy) -> bool {
    record.age_seconds(now) > policy.timeout_seconds
}

pub fn has_critical_error(record: &SessionRecord) -> bool {
    record
        .executions
        .iter()
        .filter_map(|e| e.error_message.as_deref())
        .any(|message| {
            let lower = message.to_lowercase();
            CRITICAL_MARKERS.iter().any(|m| lower.contains(m))
        })
}

/// Resolve the terminal outcome of a session.
///
/// Pure: identical record state, `now`, and policy always give the same answer.
pub fn resolve_outcome(
    record: &SessionRecord,
    now: DateTime<Utc>,
    policy: &ResolverPolicy,
) -> SessionOutcome {
    if is_expired(record, now, policy) {
        return SessionOutcome::Timeout;
    }
    if record.max_steps > 0 && record.current_step >= record.max_steps {
        return SessionOutcome::MaxStepsReached;
    }
    if record.executions.is_empty() {
        return SessionOutcome::Abandoned;
    }
    if has_critical_error(record) {
        return SessionOutcome::Error;
    }

    let successful = record.successful_steps();
    let success_rate = record.step_success_rate();
    let has_evidence = record.has_session_data() || !record.success_indicators.is_empty();
    let failure_dominates = record.failure_indicators.len() > record.success_indicators.len();

    if successful >= MIN_SUCCESSFUL_STEPS
        && success_rate >= MIN_SUCCESS_RATE
        && has_evidence
        && !failure_dominates
    {
        SessionOutcome::Success
    } else {
        SessionOutcome::Failure
    }
}

/// Freeze a session into its immutable metrics snapshot.
pub fn build_success_metrics(
    record: &SessionRecord,
    outcome: SessionOutcome,
    end_time: DateTime<Utc>,
) -> SessionSuccessMetrics {
    let completion =
        count_completed_transactions(record.transaction_type, &record.success_indicators);
    let successful = record.successful_steps() as u32;

    SessionSuccessMetrics {
        session_id: record.session_id.clone(),
        trace_id: record.trace_id.clone(),
        goal: record.goal.clone(),
        transaction_type: record.transaction_type,
        start_time: record.start_time,
        end_time,
        outcome,
        duration_seconds: record.age_seconds(end_time).max(0.0),
        total_steps: record.current_step,
        successful_steps: successful,
        failed_steps: record.failed_steps() as u32,
        step_success_rate: record.step_success_rate(),
        transactions_completed: completion.completed,
        transactions_expected: completion.expected,
        transaction_completion_rate: completion.rate(),
        has_session_data: record.has_session_data(),
        session_data_keys: record.session_data.keys().cloned().collect(),
        error_summary: record.error_summary(),
        mtba: record.current_mtba,
        mtba_violations: record.mtba_violations,
        success_indicators: record.success_indicators.iter().cloned().collect(),
        failure_indicators: record.failure_indicators.iter().cloned().collect(),
    }
}

/// Resolve (unless the caller supplied an outcome) and snapshot a session.
pub fn finalize_record(
    record: &SessionRecord,
    explicit_outcome: Option<SessionOutcome>,
    now: DateTime<Utc>,
    policy: &ResolverPolicy,
) -> SessionSuccessMetrics {
    let outcome = explicit_outcome.unwrap_or_else(|| resolve_outcome(record, now, policy));
    build_success_metrics(record, outcome, now)
}
