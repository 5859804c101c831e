use crate::stats::mean;
use sessionpulse_types::{PerformanceValidation, TargetValidation};

/// Compare the mean of `values` against `target` (lower is better).
///
/// An empty series has mean `0.0` and therefore meets any non-negative target.
pub fn validate_target(target: f64, values: &[f64], violation_count: u64) -> TargetValidation {
    let current_mean = mean(values);
    TargetValidation {
        target,
        current_mean,
        target_met: current_mean <= target,
        violation_count,
    }
}

/// Combine MTBA and TTFT validations; overall passes only if both do.
pub fn validate_performance(
    mtba: TargetValidation,
    cognitive_latency: TargetValidation,
) -> PerformanceValidation {
    let overall_performance_valid = mtba.target_met && cognitive_latency.target_met;
    PerformanceValidation {
        mtba_validation: mtba,
        cognitive_latency_validation: cognitive_latency,
        overall_performance_valid,
    }
}
