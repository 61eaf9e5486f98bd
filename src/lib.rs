//! benchdiff - Noise-aware performance regression classifier
//!
//! This library turns repeated micro-benchmark reports for a baseline and a
//! candidate revision into per-entity verdicts: each benchmark is flagged
//! only when its change clears a threshold raised by the run-to-run noise
//! and the reported error of both sides.

pub mod aggregator;
pub mod bdn;
pub mod cli;
pub mod discovery;
pub mod extractor;
pub mod json_output;
pub mod markdown_output;
pub mod regression;
pub mod report;
pub mod shards;
pub mod stats;
pub mod text;
pub mod validate;
