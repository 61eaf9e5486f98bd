//! Markdown output format for comparison reports
//!
//! Produces a GitHub-flavoured Markdown summary suitable for a pull request
//! comment: flagged regressions and improvements first, then the full
//! per-entity table (collapsed for large suites).

use crate::regression::{ComparisonResult, Direction};
use crate::report::{partition, ReportGroups};
use crate::stats::Unit;
use std::fmt::Write;

/// Full tables longer than this are wrapped in a `<details>` block
pub const COLLAPSE_THRESHOLD: usize = 20;

/// Format a nanosecond value with an appropriate unit
pub fn format_ns(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.2} s", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2} ms", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2} µs", value / 1_000.0)
    } else {
        format!("{:.2} ns", value)
    }
}

/// Format a value in the unit the comparison ran on
pub fn format_value(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Nanoseconds => format_ns(value),
        Unit::MgasPerSecond => format!("{:.1} MGas/s", value),
    }
}

fn format_opt(value: Option<f64>, unit: Unit) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format_value(v, unit))
}

fn format_cv(cv: Option<f64>) -> String {
    cv.map_or_else(|| "N/A".to_string(), |cv| format!("{:.1}%", cv))
}

/// Delta column text: signed percentage, or a label when undefined
pub fn format_delta(result: &ComparisonResult) -> String {
    if result.is_new() {
        "NEW".to_string()
    } else if result.is_removed() {
        "REMOVED".to_string()
    } else {
        match result.delta_pct {
            Some(pct) => format!("{:+.1}%", pct),
            None => "N/A".to_string(),
        }
    }
}

/// Markdown report formatter
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    title: String,
    entity_label: String,
    direction: Direction,
    unit: Unit,
}

impl Default for MarkdownOutput {
    fn default() -> Self {
        Self::new("Benchmark Comparison")
    }
}

impl MarkdownOutput {
    /// Create a formatter with the given report heading
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entity_label: "Opcode".to_string(),
            direction: Direction::default(),
            unit: Unit::default(),
        }
    }

    /// Header of the entity column (e.g. "Opcode", "Scenario")
    pub fn with_entity_label(mut self, label: impl Into<String>) -> Self {
        self.entity_label = label.into();
        self
    }

    /// Sign convention for regressions
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    fn flagged_table(&self, out: &mut String, results: &[ComparisonResult]) {
        let _ = writeln!(
            out,
            "| {} | Base | PR | Change | Threshold | CV (base / PR) |",
            self.entity_label
        );
        out.push_str("|---|---:|---:|---:|---:|---:|\n");
        for r in results {
            let _ = writeln!(
                out,
                "| {} | {} | {} | **{}** | {:.1}% | {} / {} |",
                r.entity_id,
                format_opt(r.base_value_ns, self.unit),
                format_opt(r.candidate_value_ns, self.unit),
                format_delta(r),
                r.effective_threshold_pct,
                format_cv(r.base_cv_pct()),
                format_cv(r.candidate_cv_pct()),
            );
        }
        out.push('\n');
    }

    fn full_table(&self, out: &mut String, results: &[ComparisonResult]) {
        let _ = writeln!(
            out,
            "| {} | Base | PR | Change | Threshold | Flagged | Noisy |",
            self.entity_label
        );
        out.push_str("|---|---:|---:|---:|---:|:---:|:---:|\n");
        for r in results {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {:.1}% | {} | {} |",
                r.entity_id,
                format_opt(r.base_value_ns, self.unit),
                format_opt(r.candidate_value_ns, self.unit),
                format_delta(r),
                r.effective_threshold_pct,
                if r.is_flagged { "yes" } else { "" },
                if r.is_noisy { "yes" } else { "" },
            );
        }
    }

    fn summary_line(groups: &ReportGroups) -> String {
        format!(
            "Compared {} entities: {} regressions, {} improvements, {} new, {} removed, {} noisy.",
            groups.total(),
            groups.regressions.len(),
            groups.improvements.len(),
            groups.new.len(),
            groups.removed.len(),
            groups.noisy().count()
        )
    }

    /// Render the report for results in canonical (entity id) order
    pub fn render(&self, results: &[ComparisonResult]) -> String {
        let groups = partition(results, self.direction);
        let mut out = String::new();

        let _ = writeln!(out, "## {}\n", self.title);
        let _ = writeln!(out, "{}\n", Self::summary_line(&groups));

        if groups.has_regressions() {
            out.push_str("### :warning: Regressions\n\n");
            self.flagged_table(&mut out, &groups.regressions);
        }
        if !groups.improvements.is_empty() {
            out.push_str("### :rocket: Improvements\n\n");
            self.flagged_table(&mut out, &groups.improvements);
        }
        if !groups.has_changes() {
            out.push_str(":white_check_mark: No significant changes detected.\n\n");
        }

        let noisy = groups.noisy().count();
        if noisy > 0 {
            let _ = writeln!(
                out,
                "> :information_source: {} noisy {}: measurement noise alone exceeds the \
                 reported threshold, so the effective threshold was raised.\n",
                noisy,
                if noisy == 1 { "entity" } else { "entities" }
            );
        }

        let collapse = results.len() > COLLAPSE_THRESHOLD;
        if collapse {
            out.push_str("<details>\n");
            let _ = writeln!(out, "<summary>Full results ({} entities)</summary>\n", results.len());
        } else {
            out.push_str("### All results\n\n");
        }
        self.full_table(&mut out, results);
        if collapse {
            out.push_str("\n</details>\n");
        }

        out
    }
}
