//! TestWorld pattern for declarative integration test setup.
//!
//! Provides a fluent interface for:
//! - Wiring a `MetricsCollector` to a manual clock
//! - Driving sessions step by step with controlled action spacing
//! - Running whole canned agent runs to a finalized outcome

use chrono::Duration;
use sessionpulse_engine::{IndicatorClassifier, RegexIndicatorClassifier};
use sessionpulse_runtime::{MetricsCollector, MetricsConfig};
use sessionpulse_types::{SessionOutcome, SessionSuccessMetrics};
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::fixtures::ExecutionBuilder;

/// Declarative test environment around one collector.
///
/// Executions sent through the world are stamped with the manual clock, so
/// action spacing (and therefore MTBA) is whatever the test advances by.
///
/// # Example
/// ```
/// use sessionpulse_testing::{fixtures, TestWorld};
///
/// let world = TestWorld::new().with_step_gap_ms(200);
/// let metrics = world.run_session("s1", "Complete user login flow", fixtures::successful_login_run());
/// assert!(metrics.is_successful_stateful());
/// ```
pub struct TestWorld {
    clock: Arc<ManualClock>,
    collector: MetricsCollector,
    step_gap: Duration,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a world with the default configuration and regex classifier.
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self::with_classifier(config, Arc::new(RegexIndicatorClassifier::default()))
    }

    pub fn with_classifier(
        config: MetricsConfig,
        classifier: Arc<dyn IndicatorClassifier>,
    ) -> Self {
        let clock = Arc::new(ManualClock::default());
        let collector = MetricsCollector::with_parts(config, clock.clone(), classifier);
        Self {
            clock,
            collector,
            step_gap: Duration::milliseconds(500),
        }
    }

    /// Set how far the clock moves after each action sent through `act`.
    pub fn with_step_gap_ms(mut self, ms: i64) -> Self {
        self.step_gap = Duration::milliseconds(ms);
        self
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Start a session with the configured default step limit.
    pub fn start(&self, session_id: &str, goal: &str) -> &Self {
        self.collector
            .start_tracking_session(session_id, &format!("trace-{}", session_id), goal, 0)
            .expect("Failed to start session");
        self
    }

    /// Send one execution stamped at the current time, then advance the clock.
    pub fn act(&self, session_id: &str, execution: ExecutionBuilder) -> &Self {
        let execution = execution.at_or(self.clock.now_utc()).build();
        self.collector
            .update_session_progress(session_id, execution)
            .expect("Failed to record progress");
        self.clock.advance(self.step_gap);
        self
    }

    pub fn finalize(&self, session_id: &str) -> SessionSuccessMetrics {
        self.collector
            .finalize_session(session_id, None)
            .expect("Failed to finalize session")
    }

    pub fn finalize_as(&self, session_id: &str, outcome: SessionOutcome) -> SessionSuccessMetrics {
        self.collector
            .finalize_session(session_id, Some(outcome))
            .expect("Failed to finalize session")
    }

    /// Start, feed every step, and finalize with the resolver's verdict.
    pub fn run_session(
        &self,
        session_id: &str,
        goal: &str,
        steps: Vec<ExecutionBuilder>,
    ) -> SessionSuccessMetrics {
        self.start(session_id, goal);
        for step in steps {
            self.act(session_id, step);
        }
        self.finalize(session_id)
    }
}
