//! Custom assertions for sessionpulse KPI validation.
//!
//! Provides high-level assertions that make tests more readable:
//! - Outcome and statefulness checks on finalized sessions
//! - Headline percentage bounds and exact values
//! - Presence of specific indicators

use anyhow::Result;
use sessionpulse_types::{SessionMetricsSummary, SessionOutcome, SessionSuccessMetrics};

/// Assert that a finalized session resolved to `expected`.
pub fn assert_outcome(metrics: &SessionSuccessMetrics, expected: SessionOutcome) -> Result<()> {
    if metrics.outcome != expected {
        anyhow::bail!(
            "Session {} resolved to {} but expected {} (steps={}, success_rate={:.2}, indicators={:?}/{:?})",
            metrics.session_id,
            metrics.outcome,
            expected,
            metrics.total_steps,
            metrics.step_success_rate,
            metrics.success_indicators,
            metrics.failure_indicators
        );
    }
    Ok(())
}

/// Assert that a percentage lies in `[0, 100]` and is not NaN.
pub fn assert_percentage_bounds(value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        anyhow::bail!("Percentage {} outside [0, 100]", value);
    }
    Ok(())
}

/// Assert the headline KPI of a summary equals `100 * successful / total`.
pub fn assert_summary_percentage(summary: &SessionMetricsSummary) -> Result<()> {
    assert_percentage_bounds(summary.successful_stateful_sessions_percentage)?;

    let expected = if summary.total_sessions == 0 {
        0.0
    } else {
        100.0 * summary.successful_stateful_sessions as f64 / summary.total_sessions as f64
    };
    if (summary.successful_stateful_sessions_percentage - expected).abs() > 1e-9 {
        anyhow::bail!(
            "Summary reports {}% but {}/{} sessions are successful stateful",
            summary.successful_stateful_sessions_percentage,
            summary.successful_stateful_sessions,
            summary.total_sessions
        );
    }
    Ok(())
}

/// Assert that a success indicator was recorded for the session.
pub fn assert_success_indicator(metrics: &SessionSuccessMetrics, indicator: &str) -> Result<()> {
    if !metrics.success_indicators.iter().any(|i| i == indicator) {
        anyhow::bail!(
            "Session {} missing success indicator {:?}; has {:?}",
            metrics.session_id,
            indicator,
            metrics.success_indicators
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_bounds() {
        assert!(assert_percentage_bounds(0.0).is_ok());
        assert!(assert_percentage_bounds(100.0).is_ok());
        assert!(assert_percentage_bounds(100.5).is_err());
        assert!(assert_percentage_bounds(f64::NAN).is_err());
    }

    #[test]
    fn test_summary_percentage_on_empty_summary() {
        assert!(assert_summary_percentage(&SessionMetricsSummary::default()).is_ok());
    }
}
