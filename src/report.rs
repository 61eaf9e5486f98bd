//! Grouping of comparison results for presentation
//!
//! The grouping trusts the classifier: `is_flagged` and `is_noisy` are taken
//! as given and never recomputed here. Only the sign convention (which
//! direction is "worse") is applied.

use crate::regression::{ComparisonResult, Direction};
use std::cmp::Ordering;

/// Comparison results partitioned for reporting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportGroups {
    /// Flagged changes in the "worse" direction, largest first
    pub regressions: Vec<ComparisonResult>,
    /// Flagged changes in the "better" direction, largest first
    pub improvements: Vec<ComparisonResult>,
    /// Entities within their effective threshold, by entity id
    pub neutral: Vec<ComparisonResult>,
    /// Entities only present in the candidate
    pub new: Vec<ComparisonResult>,
    /// Entities only present in the baseline
    pub removed: Vec<ComparisonResult>,
}

impl ReportGroups {
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        !self.regressions.is_empty() || !self.improvements.is_empty()
    }

    /// Total number of entities across all groups
    pub fn total(&self) -> usize {
        self.regressions.len()
            + self.improvements.len()
            + self.neutral.len()
            + self.new.len()
            + self.removed.len()
    }

    /// Entities whose noise could exceed their reported threshold
    pub fn noisy(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.regressions
            .iter()
            .chain(&self.improvements)
            .chain(&self.neutral)
            .chain(&self.new)
            .chain(&self.removed)
            .filter(|r| r.is_noisy)
    }
}

/// Sign of the change of a result that has both point estimates
fn change_sign(result: &ComparisonResult) -> Option<Ordering> {
    match result.delta_pct {
        Some(pct) => pct.partial_cmp(&0.0),
        None => match (result.base_value_ns, result.candidate_value_ns) {
            (Some(base), Some(pr)) => pr.partial_cmp(&base),
            _ => None,
        },
    }
}

fn by_magnitude_desc(a: &ComparisonResult, b: &ComparisonResult) -> Ordering {
    let magnitude = |r: &ComparisonResult| r.delta_pct.map(f64::abs);
    match (magnitude(a), magnitude(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        // Undefined percentage (zero baseline) sorts ahead: it is unbounded
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Partition comparison results into report groups
///
/// With `Direction::LowerIsBetter` (timings) a flagged positive change is a
/// regression; with `Direction::HigherIsBetter` (throughput) a flagged
/// negative change is.
pub fn partition(results: &[ComparisonResult], direction: Direction) -> ReportGroups {
    let worse = match direction {
        Direction::LowerIsBetter => Ordering::Greater,
        Direction::HigherIsBetter => Ordering::Less,
    };

    let mut groups = ReportGroups::default();
    for result in results {
        let bucket = if result.is_new() {
            &mut groups.new
        } else if result.is_removed() {
            &mut groups.removed
        } else if !result.is_flagged {
            &mut groups.neutral
        } else {
            match change_sign(result) {
                Some(sign) if sign == worse => &mut groups.regressions,
                Some(Ordering::Equal) => &mut groups.neutral,
                Some(_) => &mut groups.improvements,
                // No point estimate on one side: grouped with that side's absence
                None if result.base_value_ns.is_none() => &mut groups.new,
                None => &mut groups.removed,
            }
        };
        bucket.push(result.clone());
    }

    groups.regressions.sort_by(by_magnitude_desc);
    groups.improvements.sort_by(by_magnitude_desc);
    for group in [&mut groups.neutral, &mut groups.new, &mut groups.removed] {
        group.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    }

    groups
}
