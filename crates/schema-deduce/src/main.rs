//! CLI entry point for telemetry schema deduction.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use schema_deduce::{
    Chart, DeduceConfig, Deducer, DeductionResult, ReportGenerator, SchemaReport, WeekStart,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible week start enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliWeekStart {
    /// ISO weeks starting on Monday
    Monday,
    /// Weeks starting on Sunday
    Sunday,
}

impl From<CliWeekStart> for WeekStart {
    fn from(cli: CliWeekStart) -> Self {
        match cli {
            CliWeekStart::Monday => WeekStart::Monday,
            CliWeekStart::Sunday => WeekStart::Sunday,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Deduce dimensions, metrics and chart recommendations from telemetry records",
    long_about = "Scans a JSON array of telemetry records once, discovers dimensions and \
                  metric groups, and recommends filter widgets and charts.\n\n\
                  EXAMPLES:\n  \
                  # Human-readable summary\n  \
                  schema-deduce -i telemetry.json\n\n  \
                  # Full schema as JSON\n  \
                  schema-deduce -i telemetry.json --json | jq '.charts[].title'\n\n  \
                  # Write a summary report to ./outputs\n  \
                  schema-deduce -i telemetry.json -r"
)]
struct Args {
    /// Path to a JSON file holding an array of records
    #[arg(short, long)]
    input: String,

    /// Output directory for reports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,

    /// Print the full deduced schema as JSON to stdout
    ///
    /// Disables all logging so stdout carries only JSON.
    #[arg(long)]
    json: bool,

    /// Write a summary report to the output directory
    ///
    /// The report will be saved as <input_name>_schema_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// First day of the week for the week bucket
    #[arg(long, value_enum, default_value = "monday")]
    week_start: CliWeekStart,

    /// Dimensions with more distinct values than this get a row filter
    #[arg(long, default_value = "9")]
    row_threshold: usize,

    /// Reject the corpus when a time field cannot be parsed
    #[arg(long)]
    strict_time: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled entirely.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = DeduceConfig::builder()
        .week_start(args.week_start.into())
        .row_filter_threshold(args.row_threshold)
        .strict_timestamps(args.strict_time)
        .build()?;

    let mut builder = Deducer::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let deducer = builder.build()?;

    info!("Loading records from: {}", args.input);
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input))?;

    let result = match deducer.run_str(&json) {
        Ok(result) => result,
        Err(e) => {
            error!("Deduction failed: {}", e);
            return Err(anyhow!("Deduction failed: {}", e));
        }
    };

    handle_output(&result, &args)
}

/// Handle deduction output based on CLI flags.
///
/// - Default: human-readable summary on stdout
/// - `--json`: the full schema as JSON on stdout, nothing else
/// - `--emit-report`: summary report written to the output directory
fn handle_output(result: &DeductionResult, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.schema)?);
        return Ok(());
    }

    let report = ReportGenerator::build_report(&args.input, result);

    if args.emit_report {
        let generator = ReportGenerator::new(PathBuf::from(&args.output));
        let report_path = generator.write_report_to_file(&report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report, &result.schema.charts);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the deduced schema.
///
/// Uses `println!` rather than logging so the summary shows regardless of
/// log level.
fn print_human_readable_summary(report: &SchemaReport, charts: &[Chart]) {
    println!();
    println!("{}", "=".repeat(80));
    println!("SCHEMA DEDUCED");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input: {} ({} records)", report.input_file, report.scan.records);
    println!("Duration: {}ms", report.duration_ms);
    match (&report.time_range.start, &report.time_range.end) {
        (Some(start), Some(end)) => println!(
            "Time range: {} -> {} (native bucket: {})",
            start,
            end,
            report.time_range.native_bucket.as_deref().unwrap_or("none")
        ),
        _ => println!("Time range: none"),
    }
    println!();

    println!("DIMENSIONS");
    println!("{}", "-".repeat(40));
    println!("{:<24} {:<14} {:>8} {:>8}", "Key", "Category", "Values", "Metrics");
    for dim in &report.dimensions {
        println!(
            "{:<24} {:<14} {:>8} {:>8}",
            truncate_str(&dim.key, 23),
            dim.category,
            dim.cardinality,
            dim.metric_count
        );
    }
    println!();

    println!("METRIC GROUPS");
    println!("{}", "-".repeat(40));
    for group in &report.groups {
        println!(
            "  {} [{}] ({} dimension(s))",
            group.title,
            group.units.as_deref().unwrap_or("-"),
            group.dimension_count
        );
    }
    if report.location_count > 0 {
        println!("  Locations: {}", report.location_count);
    }
    println!();

    println!("RECOMMENDATIONS");
    println!("{}", "-".repeat(40));
    for (kind, count) in &report.filters_by_kind {
        println!("  {} filter(s): {}", kind, count);
    }
    for chart in charts.iter().take(20) {
        println!("  [{}] {}", chart.kind().as_str(), chart.title());
    }
    if charts.len() > 20 {
        println!("  ... and {} more chart(s)", charts.len() - 20);
    }
    println!();

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
