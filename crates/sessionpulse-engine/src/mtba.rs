use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionpulse_types::SessionRecord;

// NOTE: MTBA is a trailing-window mean
//
// Only the most recent `window_size` action timestamps contribute, so the
// live value tracks current agent behavior instead of being diluted by a
// slow start. A lifetime mean is intentionally not computed anywhere.

pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_THRESHOLD_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MtbaPolicy {
    pub window_size: usize,
    pub threshold_seconds: f64,
}

impl Default for MtbaPolicy {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            threshold_seconds: DEFAULT_THRESHOLD_SECONDS,
        }
    }
}

/// One trailing-mean computation, kept in the global history for percentiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtbaSample {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// Trailing mean interval in seconds.
    pub value: f64,
    pub violated: bool,
}

/// Mean interval between consecutive timestamps, in seconds.
///
/// `None` with fewer than two timestamps.
pub fn trailing_mean(timestamps: &[DateTime<Utc>]) -> Option<f64> {
    if timestamps.len() < 2 {
        return None;
    }
    let total_ms: i64 = timestamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds())
        .sum();
    Some(total_ms as f64 / 1000.0 / (timestamps.len() - 1) as f64)
}

/// Append an action to the session's trailing window and recompute MTBA.
///
/// Returns a sample once the window holds at least two actions. Each
/// sample above the threshold bumps the session's violation counter once.
pub fn record_action(
    record: &mut SessionRecord,
    at: DateTime<Utc>,
    policy: &MtbaPolicy,
) -> Option<MtbaSample> {
    let window = policy.window_size.max(2);
    record.action_timestamps.push(at);
    if record.action_timestamps.len() > window {
        let excess = record.action_timestamps.len() - window;
        record.action_timestamps.drain(..excess);
    }

    let value = trailing_mean(&record.action_timestamps)?;
    record.current_mtba = Some(value);

    let violated = value > policy.threshold_seconds;
    if violated {
        record.mtba_violations += 1;
    }

    Some(MtbaSample {
        session_id: record.session_id.clone(),
        timestamp: at,
        value,
        violated,
    })
}
