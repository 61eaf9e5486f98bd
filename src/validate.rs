//! Validation of exported benchmark result files
//!
//! The harness exports one `*-report.csv` per benchmark class. A benchmark
//! that crashed or timed out still gets a row, with `NA` in the `Mean`
//! column; such rows mean the run is incomplete and must fail CI before any
//! comparison is attempted.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of exported CSV result files
pub const REPORT_SUFFIX: &str = "-report.csv";

/// Errors for result validation
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Results directory '{}' does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("No benchmark report CSV files were produced in '{}'", .0.display())]
    NoReports(PathBuf),

    #[error("Benchmark execution issues detected (Mean=NA): {}", .0.join(", "))]
    NonNumericMean(Vec<String>),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ValidateError>;

/// Rows of one CSV report whose `Mean` is `NA`, as `<file>:<Method>`
pub fn find_failed_rows(file_name: &str, content: &str) -> Vec<String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            tracing::warn!("{} has no readable CSV header: {}", file_name, e);
            return Vec::new();
        }
    };
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(mean_col) = column("Mean") else {
        tracing::warn!("{} has no Mean column", file_name);
        return Vec::new();
    };
    let method_col = column("Method");

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed CSV record in {}: {}", file_name, e);
                None
            }
        })
        .filter(|record| {
            record
                .get(mean_col)
                .is_some_and(|mean| mean.trim().eq_ignore_ascii_case("NA"))
        })
        .map(|record| {
            let method = method_col
                .and_then(|i| record.get(i))
                .map_or("", str::trim);
            format!("{}:{}", file_name, method)
        })
        .collect()
}

/// Validate every `*-report.csv` in `results_dir`
///
/// Returns the number of validated files.
pub fn validate_results(results_dir: &Path) -> Result<usize> {
    if !results_dir.is_dir() {
        return Err(ValidateError::MissingDirectory(results_dir.to_path_buf()));
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ValidateError::Io { path, source }
    };

    let mut csv_files: Vec<PathBuf> = fs::read_dir(results_dir)
        .map_err(io_err(results_dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(REPORT_SUFFIX))
        })
        .collect();
    csv_files.sort();

    if csv_files.is_empty() {
        return Err(ValidateError::NoReports(results_dir.to_path_buf()));
    }

    let mut failed = Vec::new();
    for path in &csv_files {
        let bytes = fs::read(path).map_err(io_err(path))?;
        let content = String::from_utf8_lossy(&bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        failed.extend(find_failed_rows(&name, &content));
    }

    if !failed.is_empty() {
        for item in &failed {
            tracing::warn!("Benchmark with non-numeric mean: {}", item);
        }
        return Err(ValidateError::NonNumericMean(failed));
    }

    tracing::info!(
        "Validated {} benchmark CSV files in '{}'",
        csv_files.len(),
        results_dir.display()
    );
    Ok(csv_files.len())
}
