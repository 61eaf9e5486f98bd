//! BenchmarkDotNet JSON results
//!
//! Gas benchmarks run in chunks, each exporting a `*-full.json` report. The
//! chunks of one run are merged into a single report (first chunk's
//! metadata, benchmarks deduplicated by full name), and each benchmark is
//! turned into a per-scenario stat, either as mean time or as MGas/s
//! throughput at a fixed gas budget per scenario.

use crate::regression::Direction;
use crate::stats::{BenchStat, EntityStats, Unit};
use crate::text::decode_lossy;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of per-chunk exports
pub const CHUNK_SUFFIX: &str = "-full.json";

/// Gas executed by one scenario invocation
pub const GAS_PER_BENCHMARK: f64 = 100_000_000.0;

/// Errors for BenchmarkDotNet result handling
#[derive(Error, Debug)]
pub enum BdnError {
    #[error("No BenchmarkDotNet results given")]
    NoInputs,

    #[error("No BDN result files found in '{}'", .0.display())]
    NoResults(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed BDN JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, BdnError>;

/// One exported report; fields other than `Benchmarks` pass through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BdnReport {
    #[serde(rename = "Benchmarks", default)]
    pub benchmarks: Vec<BdnBenchmark>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BdnBenchmark {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BdnStatistics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Timing statistics in nanoseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BdnStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_deviation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<BdnConfidenceInterval>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BdnConfidenceInterval {
    /// Half-width of the interval around the mean
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BdnBenchmark {
    /// Key used to deduplicate overlapping chunks
    fn dedup_key(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.display_info.as_deref())
            .unwrap_or("")
    }

    /// Short scenario key: `Scenario=<name>` parameters, else the parameters,
    /// else the method name
    pub fn scenario_name(&self) -> String {
        match self.parameters.as_deref() {
            Some(params) if !params.is_empty() => params
                .strip_prefix("Scenario=")
                .unwrap_or(params)
                .to_string(),
            _ => self
                .method
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// What a scenario's value measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BdnMetric {
    /// Throughput in MGas/s (higher is better)
    #[default]
    Mgas,
    /// Mean execution time in nanoseconds (lower is better)
    MeanTime,
}

impl BdnMetric {
    pub fn unit(self) -> Unit {
        match self {
            BdnMetric::Mgas => Unit::MgasPerSecond,
            BdnMetric::MeanTime => Unit::Nanoseconds,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            BdnMetric::Mgas => Direction::HigherIsBetter,
            BdnMetric::MeanTime => Direction::LowerIsBetter,
        }
    }
}

/// Throughput of one scenario run taking `mean_ns`; zero for a non-positive time
pub fn mgas_per_second(mean_ns: f64) -> f64 {
    if mean_ns <= 0.0 {
        return 0.0;
    }
    GAS_PER_BENCHMARK / (mean_ns * 1e-9) / 1e6
}

fn full_name(benchmark: &BdnBenchmark) -> &str {
    benchmark.full_name.as_deref().unwrap_or("")
}

/// Merge the chunks of one run
///
/// The first chunk's metadata is kept. Benchmarks are deduplicated by full
/// name (falling back to display info), later chunks winning, and sorted by
/// full name. Returns `None` without chunks.
pub fn merge_reports<I>(chunks: I) -> Option<BdnReport>
where
    I: IntoIterator<Item = BdnReport>,
{
    let (base, benchmarks) = chunks.into_iter().fold(
        (None::<BdnReport>, BTreeMap::<String, BdnBenchmark>::new()),
        |(base, mut seen), mut chunk| {
            for benchmark in std::mem::take(&mut chunk.benchmarks) {
                let key = benchmark.dedup_key().to_string();
                if seen.insert(key.clone(), benchmark).is_some() {
                    tracing::debug!("Benchmark {:?} repeated across chunks, keeping the last", key);
                }
            }
            (base.or(Some(chunk)), seen)
        },
    );

    let mut merged = base?;
    merged.benchmarks = benchmarks.into_values().collect();
    merged
        .benchmarks
        .sort_by(|a, b| full_name(a).cmp(full_name(b)));
    Some(merged)
}

/// Read one exported report
pub fn read_report(path: &Path) -> Result<BdnReport> {
    let bytes = fs::read(path).map_err(|source| BdnError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&decode_lossy(&bytes)).map_err(|source| BdnError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every `*-full.json` chunk in `dir`, in file-name order
///
/// Malformed chunks are skipped with a warning.
pub fn load_chunks(dir: &Path) -> Result<Vec<BdnReport>> {
    let io_err = |source| BdnError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CHUNK_SUFFIX))
        })
        .collect();
    files.sort();

    let chunks: Vec<BdnReport> = files
        .iter()
        .filter_map(|path| match read_report(path) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("Skipping {}", e);
                None
            }
        })
        .collect();

    if chunks.is_empty() {
        return Err(BdnError::NoResults(dir.to_path_buf()));
    }
    tracing::debug!("Loaded {} BDN chunk(s) from {}", chunks.len(), dir.display());
    Ok(chunks)
}

/// Merge all chunks of a results directory
pub fn merge_dir(dir: &Path) -> Result<BdnReport> {
    merge_reports(load_chunks(dir)?).ok_or_else(|| BdnError::NoResults(dir.to_path_buf()))
}

/// Load one run: a results directory of chunks, or a single merged report
pub fn load_run(path: &Path) -> Result<BdnReport> {
    if path.is_dir() {
        merge_dir(path)
    } else {
        read_report(path)
    }
}

/// Write a report as indented JSON
pub fn write_report(report: &BdnReport, path: &Path) -> Result<()> {
    let io_err = |source| BdnError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(report).map_err(|source| BdnError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json + "\n").map_err(io_err)
}

/// Per-scenario stats of one run in the unit of `metric`
///
/// Benchmarks without a mean are skipped; a repeated scenario keeps the last
/// benchmark. Spread and error are scaled with the mean so the coefficient
/// of variation survives the conversion to throughput.
pub fn entity_stats(report: &BdnReport, metric: BdnMetric) -> EntityStats {
    let mut stats = EntityStats::new();
    for benchmark in &report.benchmarks {
        let scenario = benchmark.scenario_name();
        let Some(timing) = benchmark.statistics.as_ref() else {
            tracing::warn!("Benchmark {} has no statistics, skipping", scenario);
            continue;
        };
        let Some(mean) = timing.mean else {
            tracing::warn!("Benchmark {} has no mean, skipping", scenario);
            continue;
        };
        let error = timing.confidence_interval.as_ref().and_then(|ci| ci.margin);

        let stat = match metric {
            BdnMetric::MeanTime => BenchStat {
                median_ns: timing.median,
                mean_ns: Some(mean),
                error_ns: error,
                stddev_ns: timing.standard_deviation,
                ..BenchStat::new(scenario.clone())
            },
            BdnMetric::Mgas => {
                let mgas = mgas_per_second(mean);
                let relative = |spread: f64| if mean > 0.0 { mgas * spread / mean } else { 0.0 };
                BenchStat {
                    median_ns: timing.median.map(mgas_per_second),
                    mean_ns: Some(mgas),
                    error_ns: error.map(relative),
                    stddev_ns: timing.standard_deviation.map(relative),
                    ..BenchStat::new(scenario.clone())
                }
            }
        };

        if stats.insert(scenario.clone(), stat).is_some() {
            tracing::warn!("Duplicate scenario {}, keeping the last benchmark", scenario);
        }
    }
    stats
}

/// Load every run and extract its per-scenario stats, in input order
pub fn load_runs(paths: &[PathBuf], metric: BdnMetric) -> Result<Vec<EntityStats>> {
    if paths.is_empty() {
        return Err(BdnError::NoInputs);
    }
    paths
        .iter()
        .map(|path| load_run(path).map(|report| entity_stats(&report, metric)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn benchmark(full_name: &str, params: &str, mean: f64) -> Value {
        json!({
            "FullName": full_name,
            "Method": "Execute",
            "Parameters": params,
            "Statistics": { "Mean": mean, "StandardDeviation": mean / 100.0 }
        })
    }

    fn chunk(title: &str, benchmarks: Vec<Value>) -> BdnReport {
        serde_json::from_value(json!({ "Title": title, "Benchmarks": benchmarks })).unwrap()
    }

    #[test]
    fn test_scenario_name() {
        let named = |params: Option<&str>, method: Option<&str>| BdnBenchmark {
            parameters: params.map(String::from),
            method: method.map(String::from),
            ..BdnBenchmark::default()
        };
        assert_eq!(named(Some("Scenario=Transfer"), Some("Run")).scenario_name(), "Transfer");
        assert_eq!(named(Some("Size=64"), Some("Run")).scenario_name(), "Size=64");
        assert_eq!(named(Some(""), Some("Run")).scenario_name(), "Run");
        assert_eq!(named(None, None).scenario_name(), "unknown");
    }

    #[test]
    fn test_mgas_per_second() {
        // 100M gas in 100ms
        assert!((mgas_per_second(100_000_000.0) - 1000.0).abs() < 1e-9);
        assert_eq!(mgas_per_second(0.0), 0.0);
        assert_eq!(mgas_per_second(-5.0), 0.0);
    }

    #[test]
    fn test_merge_keeps_first_metadata_and_last_duplicate() {
        let first = chunk(
            "chunk-1",
            vec![
                benchmark("B.Run(Scenario=b)", "Scenario=b", 2.0),
                benchmark("A.Run(Scenario=a)", "Scenario=a", 1.0),
            ],
        );
        let second = chunk("chunk-2", vec![benchmark("A.Run(Scenario=a)", "Scenario=a", 5.0)]);

        let merged = merge_reports([first, second]).unwrap();
        assert_eq!(merged.extra["Title"], "chunk-1");
        let names: Vec<_> = merged.benchmarks.iter().map(full_name).collect();
        assert_eq!(names, vec!["A.Run(Scenario=a)", "B.Run(Scenario=b)"]);
        assert_eq!(merged.benchmarks[0].statistics.as_ref().unwrap().mean, Some(5.0));
    }

    #[test]
    fn test_merge_without_chunks() {
        assert!(merge_reports(Vec::new()).is_none());
    }

    #[test]
    fn test_load_chunks_skips_malformed_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = json!({ "Benchmarks": [benchmark("A.Run", "Scenario=a", 1.0)] });
        fs::write(dir.path().join("a-full.json"), good.to_string()).unwrap();
        fs::write(dir.path().join("b-full.json"), "{ not json").unwrap();
        fs::write(dir.path().join("c-report.csv"), "Method,Mean\n").unwrap();

        let chunks = load_chunks(dir.path()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].benchmarks.len(), 1);
    }

    #[test]
    fn test_load_chunks_none_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken-full.json"), "[").unwrap();
        assert!(matches!(load_chunks(dir.path()), Err(BdnError::NoResults(_))));
    }

    #[test]
    fn test_merged_report_preserves_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let report = json!({
            "HostEnvironmentInfo": { "Cpu": "x" },
            "Benchmarks": [{
                "FullName": "A.Run",
                "Parameters": "Scenario=a",
                "Memory": { "BytesAllocatedPerOperation": 64 },
                "Statistics": { "Mean": 10.0, "N": 15 }
            }]
        });
        fs::write(dir.path().join("x-full.json"), report.to_string()).unwrap();

        let merged = merge_dir(dir.path()).unwrap();
        let out = dir.path().join("merged.json");
        write_report(&merged, &out).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["HostEnvironmentInfo"]["Cpu"], "x");
        assert_eq!(written["Benchmarks"][0]["Memory"]["BytesAllocatedPerOperation"], 64);
        assert_eq!(written["Benchmarks"][0]["Statistics"]["N"], 15);
        assert_eq!(written["Benchmarks"][0]["Statistics"]["Mean"], 10.0);
    }

    #[test]
    fn test_entity_stats_mgas_keeps_relative_spread() {
        let report: BdnReport = serde_json::from_value(json!({
            "Benchmarks": [{
                "Parameters": "Scenario=Transfer",
                "Statistics": {
                    "Mean": 200_000_000.0,
                    "StandardDeviation": 10_000_000.0,
                    "ConfidenceInterval": { "Margin": 4_000_000.0 }
                }
            }]
        }))
        .unwrap();

        let stats = entity_stats(&report, BdnMetric::Mgas);
        let stat = &stats["Transfer"];
        assert!((stat.mean_ns.unwrap() - 500.0).abs() < 1e-9);
        assert!((stat.stddev_ns.unwrap() - 25.0).abs() < 1e-9);
        assert!((stat.error_ns.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(stat.median_ns, None);
    }

    #[test]
    fn test_entity_stats_mean_time_and_missing_mean() {
        let report: BdnReport = serde_json::from_value(json!({
            "Benchmarks": [
                { "Method": "Add", "Statistics": { "Mean": 12.5, "Median": 12.0 } },
                { "Method": "Crashed", "Statistics": null },
                { "Method": "NoMean", "Statistics": { "StandardDeviation": 1.0 } }
            ]
        }))
        .unwrap();

        let stats = entity_stats(&report, BdnMetric::MeanTime);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["Add"].mean_ns, Some(12.5));
        assert_eq!(stats["Add"].point_estimate_ns(), Some(12.0));
    }

    #[test]
    fn test_load_runs_requires_inputs() {
        assert!(matches!(load_runs(&[], BdnMetric::Mgas), Err(BdnError::NoInputs)));
    }

    #[test]
    fn test_load_run_file_parse_error_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"Benchmarks\": 3}").unwrap();
        assert!(matches!(load_run(file.path()), Err(BdnError::Parse { .. })));
    }

    #[test]
    fn test_metric_unit_and_direction() {
        assert_eq!(BdnMetric::Mgas.unit(), Unit::MgasPerSecond);
        assert_eq!(BdnMetric::Mgas.direction(), Direction::HigherIsBetter);
        assert_eq!(BdnMetric::MeanTime.direction(), Direction::LowerIsBetter);
    }
}
