// Engine module - outcome classification and latency statistics
// Pure functions over session records and timings; no locks, clocks, or I/O.
// The runtime crate owns state and calls into these with an explicit `now`.

pub mod aggregate;
pub mod capture;
pub mod classifier;
pub mod completion;
pub mod history;
pub mod indicators;
pub mod mtba;
pub mod resolver;
pub mod stats;
pub mod timing;
pub mod validation;

pub use aggregate::{performance_metrics, successful_stateful_percentage, summarize_sessions};
pub use capture::{capture_session_data, DEFAULT_SESSION_DATA_KEYS};
pub use classifier::classify_goal;
pub use completion::{count_completed_transactions, TransactionCompletion};
pub use history::BoundedHistory;
pub use indicators::{
    apply_indicators, extract_indicators, IndicatorClassifier, IndicatorSet, PatternTable,
    RegexIndicatorClassifier,
};
pub use mtba::{record_action, MtbaPolicy, MtbaSample};
pub use resolver::{finalize_record, resolve_outcome, ResolverPolicy};
pub use stats::{mean, percentile};
pub use timing::{complete_operation, derive_latencies, latency_violations, LatencyThresholds};
pub use validation::{validate_performance, validate_target};
