use anyhow::{Context, Result};
use benchdiff::cli::{
    Cli, Command, CompareArgs, InputFormat, MergeBdnArgs, OutputFormat, PlanShardsArgs,
    ValidateArgs,
};
use benchdiff::stats::{EntityStats, Unit};
use benchdiff::{
    aggregator, bdn, discovery, extractor::ReportParser, json_output::JsonOutput,
    markdown_output::MarkdownOutput, regression, report, shards, validate,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Explicit files win; otherwise discover runs in --dir
fn resolve_reports(
    files: &[PathBuf],
    dir: Option<&PathBuf>,
    pattern: &str,
    fallback: &str,
    flag: &str,
) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files.to_vec());
    }
    match dir {
        Some(dir) => discovery::collect_reports(dir, pattern, fallback),
        None => anyhow::bail!(
            "No {} reports given: pass {} or --dir",
            flag.trim_start_matches('-'),
            flag
        ),
    }
}

/// Consolidated stats of one revision, read in the selected input format
fn load_revision(args: &CompareArgs, files: &[PathBuf]) -> Result<EntityStats> {
    match args.input_format {
        InputFormat::Table => {
            let parser = if args.entity_columns.is_empty() {
                ReportParser::default()
            } else {
                ReportParser::new(args.entity_columns.iter().cloned())
            };
            Ok(aggregator::aggregate_files(files, &parser))
        }
        InputFormat::BdnJson => {
            let runs = bdn::load_runs(files, args.bdn_metric)?;
            Ok(aggregator::aggregate(&runs))
        }
    }
}

fn run_compare(args: &CompareArgs) -> Result<ExitCode> {
    let mut base_config = args.preset.config();
    if args.input_format == InputFormat::BdnJson {
        base_config.direction = args.bdn_metric.direction();
    }
    if let Some(path) = &args.config {
        base_config = base_config.with_toml_file(path)?;
    }
    let config = args.apply_overrides(base_config);
    config.validate()?;

    let unit = match args.input_format {
        InputFormat::Table => Unit::Nanoseconds,
        InputFormat::BdnJson => args.bdn_metric.unit(),
    };

    let base_files = resolve_reports(
        &args.base,
        args.dir.as_ref(),
        &args.base_pattern,
        &args.base_fallback,
        "--base",
    )?;
    let candidate_files = resolve_reports(
        &args.candidate,
        args.dir.as_ref(),
        &args.pr_pattern,
        &args.pr_fallback,
        "--candidate",
    )?;
    tracing::info!(
        "Comparing {} baseline run(s) against {} candidate run(s)",
        base_files.len(),
        candidate_files.len()
    );

    let base = load_revision(args, &base_files)?;
    let candidate = load_revision(args, &candidate_files)?;
    let results = regression::compare(&base, &candidate, &config)?;

    let rendered = match args.format {
        OutputFormat::Markdown => MarkdownOutput::new(args.title.as_str())
            .with_entity_label(args.entity_label.as_str())
            .with_direction(config.direction)
            .with_unit(unit)
            .render(&results),
        OutputFormat::Json => JsonOutput::new(&results, &config).with_unit(unit).to_json()?,
    };

    match &args.output {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None => print!("{}", rendered),
    }

    let groups = report::partition(&results, config.direction);
    if args.fail_on_regression && groups.has_regressions() {
        eprintln!(
            "{} performance regression(s) detected",
            groups.regressions.len()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_plan_shards(args: &PlanShardsArgs) -> Result<ExitCode> {
    let planned = shards::plan_from_file(
        &args.input,
        &args.output_dir,
        args.shard_count,
        &args.namespace_prefix,
    )?;
    for (i, filters) in planned.iter().enumerate() {
        println!("shard-{}: {} filter(s)", i + 1, filters.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_validate(args: &ValidateArgs) -> Result<ExitCode> {
    let count = validate::validate_results(&args.results_dir)?;
    println!("Validated {} benchmark CSV file(s)", count);
    Ok(ExitCode::SUCCESS)
}

fn run_merge_bdn(args: &MergeBdnArgs) -> Result<ExitCode> {
    let merged = bdn::merge_dir(&args.results_dir)?;
    bdn::write_report(&merged, &args.output)?;
    println!(
        "Merged {} benchmarks into {}",
        merged.benchmarks.len(),
        args.output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match &args.command {
        Command::Compare(compare) => run_compare(compare),
        Command::PlanShards(plan) => run_plan_shards(plan),
        Command::Validate(validate) => run_validate(validate),
        Command::MergeBdn(merge) => run_merge_bdn(merge),
    }
}
