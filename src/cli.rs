//! CLI argument parsing for benchdiff

use crate::bdn::BdnMetric;
use crate::discovery::{
    DEFAULT_BASE_FALLBACK, DEFAULT_BASE_PATTERN, DEFAULT_PR_FALLBACK, DEFAULT_PR_PATTERN,
};
use crate::regression::{
    ComparisonConfig, Direction, Preset, ENV_ABS_DELTA_NS_FLOOR, ENV_DELTA_MARGIN_PERCENT,
    ENV_ERROR_MULTIPLIER, ENV_NOISE_MULTIPLIER, ENV_THRESHOLD_PERCENT,
};
use crate::shards::DEFAULT_NAMESPACE_PREFIX;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for comparison reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown report for PR comments (default)
    Markdown,
    /// JSON format for machine parsing
    Json,
}

/// Shape of the benchmark inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Plain-text logs containing a Markdown results table (default)
    Table,
    /// BenchmarkDotNet JSON: a merged report or a directory of *-full.json chunks
    BdnJson,
}

#[derive(Parser, Debug)]
#[command(name = "benchdiff")]
#[command(version)]
#[command(about = "Noise-aware performance regression classifier for benchmark reports", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare baseline and candidate benchmark runs
    Compare(CompareArgs),
    /// Split a benchmark listing into shard filter files
    PlanShards(PlanShardsArgs),
    /// Check exported CSV results for failed benchmarks
    Validate(ValidateArgs),
    /// Merge chunked BenchmarkDotNet JSON results into one report
    MergeBdn(MergeBdnArgs),
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Baseline report file (repeat for multiple runs)
    #[arg(short, long = "base", value_name = "FILE")]
    pub base: Vec<PathBuf>,

    /// Candidate report file (repeat for multiple runs)
    #[arg(short, long = "candidate", value_name = "FILE")]
    pub candidate: Vec<PathBuf>,

    /// Directory to discover report files in when no files are given
    #[arg(short, long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Glob pattern for baseline runs inside --dir
    #[arg(long = "base-pattern", default_value = DEFAULT_BASE_PATTERN)]
    pub base_pattern: String,

    /// Baseline file inside --dir used when the pattern matches nothing
    #[arg(long = "base-fallback", default_value = DEFAULT_BASE_FALLBACK)]
    pub base_fallback: String,

    /// Glob pattern for candidate runs inside --dir
    #[arg(long = "pr-pattern", default_value = DEFAULT_PR_PATTERN)]
    pub pr_pattern: String,

    /// Candidate file inside --dir used when the pattern matches nothing
    #[arg(long = "pr-fallback", default_value = DEFAULT_PR_FALLBACK)]
    pub pr_fallback: String,

    /// Input format of the report files
    #[arg(long = "input-format", value_enum, default_value = "table")]
    pub input_format: InputFormat,

    /// Value compared for BenchmarkDotNet inputs
    #[arg(long = "bdn-metric", value_enum, default_value = "mgas")]
    pub bdn_metric: BdnMetric,

    /// Starting configuration, before --config and overrides
    #[arg(long = "preset", value_enum, default_value = "default")]
    pub preset: Preset,

    /// TOML configuration file, layered over the preset
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Significance threshold (percent) for reports that declare none
    #[arg(long = "threshold", value_name = "PCT", env = ENV_THRESHOLD_PERCENT)]
    pub threshold: Option<f64>,

    /// Multiplier applied to the larger coefficient of variation
    #[arg(long = "noise-multiplier", value_name = "X", env = ENV_NOISE_MULTIPLIER)]
    pub noise_multiplier: Option<f64>,

    /// Multiplier applied to the combined reported error
    #[arg(long = "error-multiplier", value_name = "X", env = ENV_ERROR_MULTIPLIER)]
    pub error_multiplier: Option<f64>,

    /// Minimum absolute change, in the unit of the compared values
    #[arg(long = "abs-floor-ns", value_name = "NS", env = ENV_ABS_DELTA_NS_FLOOR)]
    pub abs_floor_ns: Option<f64>,

    /// Extra percentage points required above the effective threshold
    #[arg(long = "margin", value_name = "PCT", env = ENV_DELTA_MARGIN_PERCENT)]
    pub margin: Option<f64>,

    /// Which way the metric moves when performance gets worse
    #[arg(long = "direction", value_enum)]
    pub direction: Option<Direction>,

    /// Entity column names in priority order (comma-separated)
    #[arg(long = "entity-column", value_delimiter = ',', value_name = "NAME")]
    pub entity_columns: Vec<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Report heading
    #[arg(long = "title", default_value = "Benchmark Comparison")]
    pub title: String,

    /// Label for the entity column in the report
    #[arg(long = "entity-label", default_value = "Opcode")]
    pub entity_label: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with status 1 when a regression is detected
    #[arg(long = "fail-on-regression")]
    pub fail_on_regression: bool,
}

impl CompareArgs {
    /// Layer command-line and environment values over a base configuration
    pub fn apply_overrides(&self, mut config: ComparisonConfig) -> ComparisonConfig {
        if let Some(v) = self.threshold {
            config.default_threshold_pct = v;
        }
        if let Some(v) = self.noise_multiplier {
            config.noise_multiplier = v;
        }
        if let Some(v) = self.error_multiplier {
            config.error_multiplier = v;
        }
        if let Some(v) = self.abs_floor_ns {
            config.abs_delta_floor_ns = v;
        }
        if let Some(v) = self.margin {
            config.delta_margin_pct = v;
        }
        if let Some(direction) = self.direction {
            config.direction = direction;
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct PlanShardsArgs {
    /// Flat benchmark listing produced by the harness
    #[arg(long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Directory receiving shard-<n>.txt files
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Number of shards
    #[arg(long = "shard-count", value_name = "N")]
    pub shard_count: usize,

    /// Prefix identifying benchmark lines
    #[arg(long = "namespace-prefix", default_value = DEFAULT_NAMESPACE_PREFIX)]
    pub namespace_prefix: String,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory holding the exported *-report.csv files
    #[arg(long = "results-dir", value_name = "DIR")]
    pub results_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct MergeBdnArgs {
    /// Directory holding the *-full.json chunks
    #[arg(long = "results-dir", value_name = "DIR")]
    pub results_dir: PathBuf,

    /// Merged report to write
    #[arg(short, long = "output", value_name = "FILE")]
    pub output: PathBuf,
}
