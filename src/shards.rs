//! Benchmark shard planning
//!
//! Splits a benchmark suite into N filter files so CI can run the shards on
//! parallel runners. The input is the harness's flat benchmark listing
//! (`Namespace.Class.Method(params)` per line); classes are distributed
//! round-robin in sorted order, so the plan is deterministic.

use crate::text::decode_strict;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default prefix identifying benchmark lines in the listing
pub const DEFAULT_NAMESPACE_PREFIX: &str = "Nethermind.";

/// Errors for shard planning
#[derive(Error, Debug)]
pub enum ShardError {
    #[error("--shard-count must be >= 1")]
    InvalidShardCount,

    #[error("Flat benchmark list '{}' does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("Could not decode benchmark list '{}' as UTF-8 or UTF-16", .0.display())]
    Decode(PathBuf),

    #[error("No benchmarks discovered for shard planning")]
    NoBenchmarks,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ShardError>;

/// Benchmark classes found in a flat listing, sorted and deduplicated
pub fn extract_benchmark_classes<'a, I>(lines: I, namespace_prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut classes = BTreeSet::new();
    for line in lines {
        let text = line.trim();
        if !text.starts_with(namespace_prefix) {
            continue;
        }

        let benchmark_name = text.split('(').next().unwrap_or(text);
        if let Some((class_name, _method)) = benchmark_name.rsplit_once('.') {
            classes.insert(class_name.to_string());
        }
    }
    classes.into_iter().collect()
}

/// Assign classes round-robin to `shard_count` shards of `*Class*` filters
pub fn plan_shards(classes: &[String], shard_count: usize) -> Result<Vec<Vec<String>>> {
    if shard_count < 1 {
        return Err(ShardError::InvalidShardCount);
    }

    let mut shards = vec![Vec::new(); shard_count];
    for (idx, class_name) in classes.iter().enumerate() {
        shards[idx % shard_count].push(format!("*{}*", class_name));
    }
    Ok(shards)
}

/// Write `shard-<n>.txt` files (1-based) into `output_dir`
pub fn write_shards(shards: &[Vec<String>], output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|source| ShardError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(shards.len());
    for (i, filters) in shards.iter().enumerate() {
        let target = output_dir.join(format!("shard-{}.txt", i + 1));
        let mut content = filters.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&target, content).map_err(|source| ShardError::Io {
            path: target.clone(),
            source,
        })?;
        written.push(target);
    }
    Ok(written)
}

/// Read a flat listing, plan the shards, and write the filter files
///
/// Returns the shard filter lists in shard order.
pub fn plan_from_file(
    input: &Path,
    output_dir: &Path,
    shard_count: usize,
    namespace_prefix: &str,
) -> Result<Vec<Vec<String>>> {
    if shard_count < 1 {
        return Err(ShardError::InvalidShardCount);
    }
    if !input.exists() {
        return Err(ShardError::MissingInput(input.to_path_buf()));
    }

    let raw = fs::read(input).map_err(|source| ShardError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let text = decode_strict(&raw).ok_or_else(|| ShardError::Decode(input.to_path_buf()))?;

    let classes = extract_benchmark_classes(text.lines(), namespace_prefix);
    if classes.is_empty() {
        return Err(ShardError::NoBenchmarks);
    }
    tracing::info!("Discovered {} benchmark classes", classes.len());

    let shards = plan_shards(&classes, shard_count)?;
    write_shards(&shards, output_dir)?;
    Ok(shards)
}
