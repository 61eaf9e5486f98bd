//! Aggregation of repeated benchmark runs
//!
//! Each revision is benchmarked several times. The runs are consolidated
//! field by field: every field of the aggregated record is the median of the
//! values the individual runs reported for it. A field no run reported stays
//! missing.

use crate::extractor::ReportParser;
use crate::regression::median;
use crate::stats::{AggregatedStat, EntityStats};
use crate::text::decode_lossy;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-field samples collected for one entity across runs
#[derive(Debug, Default)]
struct FieldSamples {
    median: Vec<f64>,
    mean: Vec<f64>,
    error: Vec<f64>,
    stddev: Vec<f64>,
    threshold: Vec<f64>,
}

impl FieldSamples {
    fn push(&mut self, stat: &AggregatedStat) {
        self.median.extend(stat.median_ns);
        self.mean.extend(stat.mean_ns);
        self.error.extend(stat.error_ns);
        self.stddev.extend(stat.stddev_ns);
        self.threshold.extend(stat.reported_threshold_pct);
    }

    fn consolidate(self, entity_id: String) -> AggregatedStat {
        AggregatedStat {
            entity_id,
            median_ns: median(&self.median),
            mean_ns: median(&self.mean),
            error_ns: median(&self.error),
            stddev_ns: median(&self.stddev),
            reported_threshold_pct: median(&self.threshold),
        }
    }
}

/// Consolidate the reports of one revision into one record per entity
///
/// Every entity seen in any report is present in the result. Ingestion order
/// does not matter.
///
/// # Example
/// ```
/// use benchdiff::aggregator::aggregate;
/// use benchdiff::extractor::parse_report;
///
/// let runs = [
///     parse_report("| Opcode | Mean |\n|---|---|\n| ADD | 1 ns |\n"),
///     parse_report("| Opcode | Mean |\n|---|---|\n| ADD | 3 ns |\n"),
/// ];
/// let merged = aggregate(&runs);
/// assert_eq!(merged["ADD"].mean_ns, Some(2.0));
/// ```
pub fn aggregate<'a, I>(reports: I) -> EntityStats
where
    I: IntoIterator<Item = &'a EntityStats>,
{
    let samples = reports.into_iter().fold(
        BTreeMap::<String, FieldSamples>::new(),
        |mut acc, report| {
            for (entity_id, stat) in report {
                acc.entry(entity_id.clone()).or_default().push(stat);
            }
            acc
        },
    );

    samples
        .into_iter()
        .map(|(entity_id, fields)| (entity_id.clone(), fields.consolidate(entity_id)))
        .collect()
}

/// Read and extract one report file
///
/// An unreadable file is a skipped run: it is logged and yields no entities.
pub fn load_report(path: &Path, parser: &ReportParser) -> EntityStats {
    match fs::read(path) {
        Ok(bytes) => {
            let stats = parser.parse(&decode_lossy(&bytes));
            tracing::debug!("Extracted {} entities from {}", stats.len(), path.display());
            stats
        }
        Err(e) => {
            tracing::warn!("Skipping unreadable report {}: {}", path.display(), e);
            EntityStats::new()
        }
    }
}

/// Read and extract several report files in parallel
///
/// Results are returned in the order of `paths`.
pub fn load_reports(paths: &[PathBuf], parser: &ReportParser) -> Vec<EntityStats> {
    if paths.len() <= 1 {
        return paths.iter().map(|p| load_report(p, parser)).collect();
    }

    let loaded = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| scope.spawn(move |_| load_report(path, parser)))
            .collect();

        handles
            .into_iter()
            .zip(paths)
            .map(|(handle, path)| {
                handle.join().unwrap_or_else(|_| {
                    tracing::warn!("Report parser panicked on {}", path.display());
                    EntityStats::new()
                })
            })
            .collect::<Vec<_>>()
    });

    loaded.unwrap_or_else(|_| {
        tracing::warn!("Report loading scope panicked");
        Vec::new()
    })
}

/// Load the reports of one revision and consolidate them
pub fn aggregate_files(paths: &[PathBuf], parser: &ReportParser) -> EntityStats {
    let reports = load_reports(paths, parser);
    aggregate(&reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::BenchStat;
    use std::io::Write;

    fn report(stats: &[BenchStat]) -> EntityStats {
        stats
            .iter()
            .map(|s| (s.entity_id.clone(), s.clone()))
            .collect()
    }

    fn stat(id: &str, mean: f64, error: Option<f64>) -> BenchStat {
        BenchStat {
            mean_ns: Some(mean),
            error_ns: error,
            ..BenchStat::new(id)
        }
    }

    #[test]
    fn test_aggregate_median_of_runs() {
        let runs = vec![
            report(&[stat("ADD", 10.0, Some(0.1))]),
            report(&[stat("ADD", 30.0, Some(0.3))]),
            report(&[stat("ADD", 20.0, Some(0.2))]),
        ];
        let merged = aggregate(&runs);
        assert_eq!(merged["ADD"].mean_ns, Some(20.0));
        assert_eq!(merged["ADD"].error_ns, Some(0.2));
    }

    #[test]
    fn test_aggregate_tolerates_missing_field() {
        let runs = vec![
            report(&[stat("ADD", 10.0, Some(0.1))]),
            report(&[stat("ADD", 11.0, None)]),
            report(&[stat("ADD", 12.0, Some(0.3))]),
        ];
        let merged = aggregate(&runs);
        let error = merged["ADD"].error_ns.unwrap();
        assert!((error - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_missing_everywhere_stays_missing() {
        let runs = vec![report(&[stat("ADD", 10.0, None)])];
        let merged = aggregate(&runs);
        assert_eq!(merged["ADD"].error_ns, None);
        assert_eq!(merged["ADD"].median_ns, None);
        assert_eq!(merged["ADD"].stddev_ns, None);
    }

    #[test]
    fn test_aggregate_union_of_entities() {
        let runs = vec![
            report(&[stat("ADD", 10.0, None)]),
            report(&[stat("MUL", 20.0, None)]),
            EntityStats::new(),
        ];
        let merged = aggregate(&runs);
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["ADD", "MUL"]);
        assert_eq!(merged["MUL"].mean_ns, Some(20.0));
    }

    #[test]
    fn test_aggregate_single_report_is_identity() {
        let single = report(&[
            BenchStat {
                median_ns: Some(9.5),
                mean_ns: Some(10.0),
                error_ns: Some(0.1),
                stddev_ns: Some(0.2),
                reported_threshold_pct: Some(7.0),
                entity_id: "ADD".into(),
            },
            stat("MUL", 3.0, None),
        ]);
        assert_eq!(aggregate([&single]), single);
    }

    #[test]
    fn test_aggregate_order_independent() {
        let a = report(&[stat("ADD", 10.0, Some(0.1))]);
        let b = report(&[stat("ADD", 14.0, None), stat("MUL", 2.0, None)]);
        let c = report(&[stat("ADD", 11.0, Some(0.5))]);
        assert_eq!(aggregate([&a, &b, &c]), aggregate([&c, &a, &b]));
    }

    #[test]
    fn test_aggregate_no_reports() {
        let none: Vec<EntityStats> = Vec::new();
        assert!(aggregate(&none).is_empty());
    }

    #[test]
    fn test_load_reports_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (i, mean) in ["1 ns", "2 ns", "3 ns"].iter().enumerate() {
            let path = dir.path().join(format!("run-{}.log", i));
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "| Opcode | Mean |\n|---|---|\n| ADD | {} |", mean).unwrap();
            paths.push(path);
        }

        let reports = load_reports(&paths, &ReportParser::default());
        let means: Vec<_> = reports.iter().map(|r| r["ADD"].mean_ns).collect();
        assert_eq!(means, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_missing_file_is_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("absent.log")];
        let reports = load_reports(&paths, &ReportParser::default());
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_empty());
    }
}
