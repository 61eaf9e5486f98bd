// Per-entity classification of baseline vs candidate statistics
//
// For every entity in the union of both revisions:
// - pick a point estimate (median, else mean) per revision
// - derive the effective threshold from the reported threshold, the noise
//   floor and the uncertainty floor
// - flag the entity when the change clears both the relative bar
//   (effective threshold + margin) and the absolute floor
//
// Missing data never raises: appearing/disappearing entities are flagged,
// absent noise estimates count as zero. Only an empty union is an error.

use crate::regression::config::ComparisonConfig;
use crate::regression::noise_filter::{cv_percent, noise_floor, uncertainty_floor};
use crate::stats::{AggregatedStat, EntityStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Fatal comparison failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("No benchmark entities found in either baseline or candidate reports")]
    NoEntities,
}

/// Classification of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub entity_id: String,
    pub base: Option<AggregatedStat>,
    pub candidate: Option<AggregatedStat>,

    /// Baseline point estimate (median, else mean)
    pub base_value_ns: Option<f64>,
    /// Candidate point estimate (median, else mean)
    pub candidate_value_ns: Option<f64>,

    /// Relative change in percent; undefined for new/removed entities and a
    /// zero baseline
    pub delta_pct: Option<f64>,
    /// Absolute change in nanoseconds, defined alongside `delta_pct`
    pub delta_abs_ns: Option<f64>,

    /// Threshold declared by the reports, or the configured default
    pub reported_threshold_pct: f64,
    pub noise_floor_pct: f64,
    pub uncertainty_floor_pct: f64,
    /// max(reported threshold, noise floor, uncertainty floor)
    pub effective_threshold_pct: f64,

    pub is_flagged: bool,
    /// Noise alone could exceed the reported threshold
    pub is_noisy: bool,
}

impl ComparisonResult {
    /// Entity only present in the candidate
    pub fn is_new(&self) -> bool {
        self.base.is_none()
    }

    /// Entity only present in the baseline
    pub fn is_removed(&self) -> bool {
        self.candidate.is_none()
    }

    pub fn base_cv_pct(&self) -> Option<f64> {
        self.base
            .as_ref()
            .and_then(|s| cv_percent(s.mean_ns, s.stddev_ns))
    }

    pub fn candidate_cv_pct(&self) -> Option<f64> {
        self.candidate
            .as_ref()
            .and_then(|s| cv_percent(s.mean_ns, s.stddev_ns))
    }
}

/// Classify a single entity
///
/// At least one of `base` / `candidate` is expected to be present.
pub fn classify(
    entity_id: &str,
    base: Option<&AggregatedStat>,
    candidate: Option<&AggregatedStat>,
    config: &ComparisonConfig,
) -> ComparisonResult {
    let base_value = base.and_then(AggregatedStat::point_estimate_ns);
    let pr_value = candidate.and_then(AggregatedStat::point_estimate_ns);

    let reported_threshold = base
        .and_then(|s| s.reported_threshold_pct)
        .or_else(|| candidate.and_then(|s| s.reported_threshold_pct))
        .unwrap_or(config.default_threshold_pct);

    let base_cv = base.and_then(|s| cv_percent(s.mean_ns, s.stddev_ns));
    let pr_cv = candidate.and_then(|s| cv_percent(s.mean_ns, s.stddev_ns));
    let noise = noise_floor(base_cv, pr_cv, config.noise_multiplier);
    let uncertainty = uncertainty_floor(
        base_value,
        base.and_then(|s| s.error_ns),
        candidate.and_then(|s| s.error_ns),
        config.error_multiplier,
    );

    let effective_threshold = reported_threshold.max(noise).max(uncertainty);
    let is_noisy = noise > reported_threshold || uncertainty > reported_threshold;

    let mut delta_pct = None;
    let mut delta_abs_ns = None;
    let is_flagged = match (base_value, pr_value) {
        (Some(base_value), Some(pr_value)) if base_value == 0.0 => pr_value != 0.0,
        (Some(base_value), Some(pr_value)) => {
            let pct = (pr_value - base_value) / base_value * 100.0;
            let abs = (pr_value - base_value).abs();
            delta_pct = Some(pct);
            delta_abs_ns = Some(abs);
            pct.abs() >= effective_threshold + config.delta_margin_pct
                && abs >= config.abs_delta_floor_ns
        }
        // Added or removed (or no usable point estimate on one side)
        _ => true,
    };

    ComparisonResult {
        entity_id: entity_id.to_string(),
        base: base.cloned(),
        candidate: candidate.cloned(),
        base_value_ns: base_value,
        candidate_value_ns: pr_value,
        delta_pct,
        delta_abs_ns,
        reported_threshold_pct: reported_threshold,
        noise_floor_pct: noise,
        uncertainty_floor_pct: uncertainty,
        effective_threshold_pct: effective_threshold,
        is_flagged,
        is_noisy,
    }
}

/// Compare baseline and candidate statistics for every entity
///
/// Results are sorted by entity id. Fails only when both inputs are empty.
///
/// # Example
/// ```
/// use benchdiff::regression::{compare, ComparisonConfig};
/// use benchdiff::stats::{BenchStat, EntityStats};
///
/// let mut base = EntityStats::new();
/// base.insert("ADD".into(), BenchStat { median_ns: Some(100.0), ..BenchStat::new("ADD") });
/// let mut candidate = EntityStats::new();
/// candidate.insert("ADD".into(), BenchStat { median_ns: Some(150.0), ..BenchStat::new("ADD") });
///
/// let results = compare(&base, &candidate, &ComparisonConfig::default()).unwrap();
/// assert!(results[0].is_flagged);
/// assert_eq!(results[0].delta_pct, Some(50.0));
/// ```
pub fn compare(
    base: &EntityStats,
    candidate: &EntityStats,
    config: &ComparisonConfig,
) -> Result<Vec<ComparisonResult>, CompareError> {
    let entities: BTreeSet<&String> = base.keys().chain(candidate.keys()).collect();
    if entities.is_empty() {
        return Err(CompareError::NoEntities);
    }

    let results: Vec<ComparisonResult> = entities
        .into_iter()
        .map(|id| classify(id, base.get(id), candidate.get(id), config))
        .collect();

    tracing::info!(
        "Compared {} entities ({} flagged, {} noisy)",
        results.len(),
        results.iter().filter(|r| r.is_flagged).count(),
        results.iter().filter(|r| r.is_noisy).count()
    );

    Ok(results)
}
