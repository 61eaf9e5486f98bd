// Noise estimation for benchmark comparisons
//
// Two independent estimators raise the significance bar for an entity:
//
// - Noise floor: run-to-run variability, from the coefficient of variation
//   (CV = stddev / mean) of either revision. Fast operations measured in a
//   few nanoseconds routinely show CVs well above any sensible fixed
//   threshold.
// - Uncertainty floor: the harness's own confidence interval half-widths
//   ("Error" column) of both revisions, relative to the baseline value.
//
// Neither estimator ever lowers the configured threshold.

/// Coefficient of variation as a percentage
///
/// Defined only when both values are present and `mean > 0`.
///
/// # Example
/// ```
/// use benchdiff::regression::cv_percent;
///
/// assert_eq!(cv_percent(Some(10.0), Some(0.5)), Some(5.0));
/// assert_eq!(cv_percent(Some(0.0), Some(0.5)), None);
/// assert_eq!(cv_percent(Some(10.0), None), None);
/// ```
pub fn cv_percent(mean: Option<f64>, stddev: Option<f64>) -> Option<f64> {
    match (mean, stddev) {
        (Some(mean), Some(stddev)) if mean > 0.0 => Some(stddev / mean * 100.0),
        _ => None,
    }
}

/// Noise floor (percent): the larger defined CV times `noise_multiplier`
///
/// Zero when neither CV is defined.
pub fn noise_floor(base_cv: Option<f64>, candidate_cv: Option<f64>, noise_multiplier: f64) -> f64 {
    base_cv
        .into_iter()
        .chain(candidate_cv)
        .reduce(f64::max)
        .map_or(0.0, |cv| cv * noise_multiplier)
}

/// Uncertainty floor (percent) from the reported error of both revisions
///
/// Zero when the baseline value is missing or not positive, or when neither
/// revision reported an error. A single missing error counts as zero.
pub fn uncertainty_floor(
    base_value: Option<f64>,
    base_error: Option<f64>,
    candidate_error: Option<f64>,
    error_multiplier: f64,
) -> f64 {
    let Some(base_value) = base_value.filter(|v| *v > 0.0) else {
        return 0.0;
    };
    if base_error.is_none() && candidate_error.is_none() {
        return 0.0;
    }

    let combined = base_error.unwrap_or(0.0) + candidate_error.unwrap_or(0.0);
    combined / base_value * 100.0 * error_multiplier
}
