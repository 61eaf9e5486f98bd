//! Per-entity benchmark statistics
//!
//! One `BenchStat` describes an entity (opcode or scenario) either as it was
//! read from a single report, or after consolidating several repeated runs
//! of the same revision. Every numeric field is independently optional:
//! absence means "unknown", never zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit of the values carried in a `BenchStat`
///
/// Table reports carry timings; throughput inputs carry MGas/s under the
/// same fields, so the `_ns` suffixes read as "in the report's unit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    #[default]
    Nanoseconds,
    MgasPerSecond,
}

/// Statistics for one entity, timings in nanoseconds unless stated otherwise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchStat {
    /// Entity name (opcode, scenario, ...)
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_ns: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_ns: Option<f64>,
    /// Half-width of the harness-reported confidence interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_ns: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev_ns: Option<f64>,
    /// Per-entity significance threshold declared by the report (percent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_threshold_pct: Option<f64>,
}

/// Measurement of one entity taken from one report
pub type RawStat = BenchStat;

/// Consolidation of one entity across the repeated runs of a revision
pub type AggregatedStat = BenchStat;

/// Entity id → statistics, ordered by entity id
pub type EntityStats = BTreeMap<String, BenchStat>;

impl BenchStat {
    /// Create an empty record for `entity_id`
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Point estimate used for comparison: median, falling back to mean
    pub fn point_estimate_ns(&self) -> Option<f64> {
        self.median_ns.or(self.mean_ns)
    }

    /// Coefficient of variation in percent (see `regression::cv_percent`)
    pub fn cv_pct(&self) -> Option<f64> {
        crate::regression::cv_percent(self.mean_ns, self.stddev_ns)
    }
}
