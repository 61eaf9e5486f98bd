//! Report file discovery
//!
//! CI jobs drop one log per benchmark run next to each other
//! (`evm-opcodes-base-1.log`, `evm-opcodes-base-2.log`, ...). Discovery
//! lists the runs of one revision by glob, sorted by file name.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

/// Default wildcard for baseline runs
pub const DEFAULT_BASE_PATTERN: &str = "evm-opcodes-base*.log";
/// Default single-run baseline file
pub const DEFAULT_BASE_FALLBACK: &str = "evm-opcodes-base.log";
/// Default wildcard for candidate runs
pub const DEFAULT_PR_PATTERN: &str = "evm-opcodes-pr*.log";
/// Default single-run candidate file
pub const DEFAULT_PR_FALLBACK: &str = "evm-opcodes-pr.log";

/// Compile a file-name glob such as `evm-opcodes-pr*.log`
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(pattern).with_context(|| format!("Invalid file pattern: {}", pattern))?;
    Ok(glob.compile_matcher())
}

/// List the report files of one revision
///
/// Returns the files in `dir` matching `pattern`, sorted by name. When none
/// match, returns `dir/fallback` if that file exists, otherwise nothing.
pub fn collect_reports(dir: &Path, pattern: &str, fallback: &str) -> Result<Vec<PathBuf>> {
    let matcher = compile_pattern(pattern)?;
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list report directory: {}", dir.display()))?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to list report directory: {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if matcher.is_match(name) {
            matches.push(path);
        }
    }
    matches.sort();

    if matches.is_empty() {
        let fallback = dir.join(fallback);
        if fallback.is_file() {
            tracing::debug!(
                "No reports match {}, using {}",
                pattern,
                fallback.display()
            );
            matches.push(fallback);
        } else {
            tracing::warn!(
                "No reports match {} in {}",
                pattern,
                dir.display()
            );
        }
    }

    Ok(matches)
}
