// Robust point statistics over repeated benchmark runs
//
// Medians are used everywhere a single value has to stand in for several
// runs: they are insensitive to the odd run disturbed by a noisy neighbour
// and independent of the order in which runs are supplied.

/// Median of a sample, averaging the two middle values for even sizes
///
/// Returns `None` for an empty sample. Non-finite values are ignored.
///
/// # Example
/// ```
/// use benchdiff::regression::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
/// assert_eq!(median(&[]), None);
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
