//! JSON output format for comparison reports
//!
//! Machine-readable counterpart of the Markdown report: the configuration
//! used, a summary of the report groups, and every comparison record in
//! entity-id order.

use crate::regression::{ComparisonConfig, ComparisonResult};
use crate::report::partition;
use crate::stats::Unit;
use serde::{Deserialize, Serialize};

/// Entity ids per report group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Total number of compared entities
    pub total: usize,
    pub regressions: Vec<String>,
    pub improvements: Vec<String>,
    pub new: Vec<String>,
    pub removed: Vec<String>,
    pub noisy: Vec<String>,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Output format version
    pub version: String,
    /// Configuration the comparison ran with
    pub config: ComparisonConfig,
    /// Unit of every value in `results`
    #[serde(default)]
    pub unit: Unit,
    pub summary: JsonSummary,
    /// One record per entity, sorted by entity id
    pub results: Vec<ComparisonResult>,
}

fn entity_ids<'a>(results: impl IntoIterator<Item = &'a ComparisonResult>) -> Vec<String> {
    results.into_iter().map(|r| r.entity_id.clone()).collect()
}

impl JsonOutput {
    /// Build the output from comparison results
    pub fn new(results: &[ComparisonResult], config: &ComparisonConfig) -> Self {
        let groups = partition(results, config.direction);
        let summary = JsonSummary {
            total: results.len(),
            regressions: entity_ids(&groups.regressions),
            improvements: entity_ids(&groups.improvements),
            new: entity_ids(&groups.new),
            removed: entity_ids(&groups.removed),
            noisy: {
                let mut noisy = entity_ids(groups.noisy());
                noisy.sort();
                noisy
            },
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: config.clone(),
            unit: Unit::default(),
            summary,
            results: results.to_vec(),
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
