//! Benchmark report extraction
//!
//! Turns one textual harness report into per-entity raw statistics. The
//! report is expected to contain a pipe-delimited summary table such as:
//!
//! ```text
//! | Opcode |     Mean |    Error |   StdDev |   Median |
//! |------- |---------:|---------:|---------:|---------:|
//! | ADD    | 1.234 ns | 0.010 ns | 0.020 ns | 1.230 ns |
//! ```
//!
//! Rows that cannot be used are skipped, never reported as errors: a report
//! with no usable table is simply an empty run.

use crate::stats::{BenchStat, EntityStats};
use crate::text::normalize;
use regex::Regex;
use std::sync::OnceLock;

/// Column and row delimiter of the summary table
pub const ROW_DELIMITER: char = '|';

/// Default entity-name column headers, in priority order
pub const DEFAULT_ENTITY_COLUMNS: &[&str] = &["Opcode", "Scenario", "Method"];

const MEAN_COLUMN: &str = "Mean";
const MEDIAN_COLUMN: &str = "Median";
const ERROR_COLUMN: &str = "Error";
const STDDEV_COLUMN: &str = "StdDev";
const THRESHOLD_COLUMN: &str = "Threshold";

fn value_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([-+]?[0-9][0-9,]*(?:\.[0-9]+)?)\s*([a-zA-Zµμ]+)\s*$")
            .expect("Failed to compile timing value pattern")
    })
}

/// Scale factor from a time unit suffix to nanoseconds
fn unit_to_ns(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(1_000.0),
        "ms" => Some(1_000_000.0),
        "s" => Some(1_000_000_000.0),
        _ => None,
    }
}

/// Parse a timing cell such as `1,234.5 us` into nanoseconds
///
/// Returns `None` for anything that is not `<number><unit>` with a known
/// unit. An unknown unit is "missing", never zero.
pub fn parse_ns(cell: &str) -> Option<f64> {
    let caps = value_pattern().captures(cell.trim())?;
    let number: f64 = caps[1].replace(',', "").parse().ok()?;
    let scale = unit_to_ns(&caps[2])?;
    Some(number * scale)
}

/// Parse a threshold cell (plain percentage, optional `%` suffix)
pub fn parse_threshold(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    let cell = cell.strip_suffix('%').unwrap_or(cell).trim_end();
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn split_cells(line: &str) -> Vec<&str> {
    line.trim()
        .trim_matches(ROW_DELIMITER)
        .split(ROW_DELIMITER)
        .map(str::trim)
        .collect()
}

fn is_separator_row(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Column positions resolved from a table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    entity: usize,
    mean: usize,
    median: Option<usize>,
    error: Option<usize>,
    stddev: Option<usize>,
    threshold: Option<usize>,
}

impl Columns {
    fn required_len(&self) -> usize {
        self.entity.max(self.mean) + 1
    }
}

/// Extractor for pipe-delimited benchmark summary tables
#[derive(Debug, Clone)]
pub struct ReportParser {
    entity_columns: Vec<String>,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(DEFAULT_ENTITY_COLUMNS.iter().copied())
    }
}

impl ReportParser {
    /// Create a parser recognising the given entity-name column headers
    ///
    /// Earlier names win when a header contains several of them.
    pub fn new<I, S>(entity_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_columns: entity_columns.into_iter().map(Into::into).collect(),
        }
    }

    fn resolve_columns(&self, line: &str) -> Option<Columns> {
        if !line.trim_start().starts_with(ROW_DELIMITER) {
            return None;
        }
        let headers = split_cells(line);
        let find = |name: &str| headers.iter().position(|h| *h == name);

        let entity = self.entity_columns.iter().find_map(|name| find(name.as_str()))?;
        let mean = find(MEAN_COLUMN)?;
        Some(Columns {
            entity,
            mean,
            median: find(MEDIAN_COLUMN),
            error: find(ERROR_COLUMN),
            stddev: find(STDDEV_COLUMN),
            threshold: find(THRESHOLD_COLUMN),
        })
    }

    /// Extract entity statistics from one report
    ///
    /// The last table header in the report is used (harnesses print the
    /// final summary after any intermediate output). Returns an empty map
    /// when no header is found.
    pub fn parse(&self, report_text: &str) -> EntityStats {
        let text = normalize(report_text);
        let lines: Vec<&str> = text.lines().collect();

        let Some((header_idx, columns)) = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| self.resolve_columns(line).map(|c| (i, c)))
            .last()
        else {
            tracing::debug!("No summary table header found in report");
            return EntityStats::new();
        };

        let mut data = EntityStats::new();
        let rows = lines[header_idx + 1..]
            .iter()
            .copied()
            .map(|line| line.trim())
            .skip_while(|line| line.starts_with(ROW_DELIMITER) && is_separator_row(line))
            .take_while(|line| line.starts_with(ROW_DELIMITER));

        for line in rows {
            let cells = split_cells(line);
            if cells.len() < columns.required_len() {
                tracing::warn!("Skipping short report row: {}", line);
                continue;
            }

            let entity = cells[columns.entity];
            if entity.is_empty() {
                continue;
            }
            let Some(mean) = parse_ns(cells[columns.mean]) else {
                tracing::warn!(
                    "Skipping {}: unparseable mean {:?}",
                    entity,
                    cells[columns.mean]
                );
                continue;
            };

            let cell = |col: Option<usize>| col.and_then(|i| cells.get(i).copied());
            let stat = BenchStat {
                entity_id: entity.to_string(),
                median_ns: cell(columns.median).and_then(parse_ns),
                mean_ns: Some(mean),
                error_ns: cell(columns.error).and_then(parse_ns),
                stddev_ns: cell(columns.stddev).and_then(parse_ns),
                reported_threshold_pct: cell(columns.threshold).and_then(parse_threshold),
            };

            if data.insert(entity.to_string(), stat).is_some() {
                tracing::warn!("Duplicate entity {} in report, keeping last row", entity);
            }
        }

        data
    }
}

/// Extract entity statistics using the default entity columns
pub fn parse_report(report_text: &str) -> EntityStats {
    ReportParser::default().parse(report_text)
}
