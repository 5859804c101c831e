// Shared numeric helpers. Every function here is total: empty input yields
// 0.0 rather than NaN so callers can serialize results unconditionally.

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile by linear interpolation between closest ranks.
///
/// Sorts a copy ascending, takes `index = p/100 * (n-1)` and interpolates
/// between the floor and ceiling ranks. `p` is clamped to `[0, 100]`.
/// An empty series yields `0.0`, which callers must read as "no data".
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, p)
}

/// Same as [`percentile`] for input that is already sorted ascending.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };
    let index = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = index - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// `100 * part / whole`, `0.0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    100.0 * part as f64 / whole as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_edge_cases() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0), 3.0);
        assert_eq!(percentile(&[42.0], 0.0), 42.0);
        assert_eq!(percentile(&[42.0], 99.0), 42.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_percentile_interpolates_between_ranks() {
        // index = 0.95 * 3 = 2.85 -> 3 + 0.85 * (4 - 3)
        let p95 = percentile(&[4.0, 1.0, 3.0, 2.0], 95.0);
        assert!((p95 - 3.85).abs() < 1e-9);
        assert_eq!(percentile(&[10.0, 20.0], 50.0), 15.0);
    }

    #[test]
    fn test_percentile_bounds_are_min_and_max() {
        let values = [7.0, 3.0, 9.0, 1.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 9.0);
        assert_eq!(percentile(&values, 250.0), 9.0);
    }

    #[test]
    fn test_mean_and_percentage_never_nan() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
