use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, error::ErrorKind};

use crate::config::{AnalyticsConfig, RetryPolicy};
use crate::constants::defaults::{CACHE_TTL_SECS, CHUNK_SIZE, RETRY_ATTEMPTS, RETRY_DELAY_MS, WORKERS};
use crate::constants::platform::DEFAULT_REPORT_FILENAME;
use crate::metrics::SummaryStatistics;
use crate::platform::AnalyticsPlatform;

#[derive(Debug, Parser)]
#[command(
    name = "pilgrim_demo",
    disable_help_subcommand = true,
    about = "End-to-end pilgrim analytics run",
    long_about = "Generate synthetic pilgrim records, compute cached summary statistics, stream the collection in fixed windows, run the parallel aggregations, and export a JSON report."
)]
/// CLI for `pilgrim_demo`.
///
/// Common usage:
/// - Defaults mirror the full demo: 50,000 records, 10,000-record windows
/// - Smaller run: `--count 5000 --chunk-size 1000`
/// - Reproducible run: `--seed 7`
struct PilgrimDemoCli {
    #[command(flatten)]
    platform: PlatformArgs,
    #[arg(
        long,
        default_value_t = 50_000,
        help = "Number of synthetic records to generate"
    )]
    count: usize,
    #[arg(
        long = "chunk-size",
        default_value_t = 10_000,
        value_parser = parse_positive_usize,
        help = "Window size used by streaming analysis"
    )]
    chunk_size: usize,
    #[arg(
        long = "preview-chunks",
        default_value_t = 3,
        help = "Number of streamed windows to print"
    )]
    preview_chunks: usize,
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_REPORT_FILENAME,
        help = "Destination of the exported JSON report"
    )]
    output: PathBuf,
}

#[derive(Debug, Parser)]
#[command(
    name = "basic_usage",
    disable_help_subcommand = true,
    about = "Load records and print summary statistics"
)]
struct BasicUsageCli {
    #[command(flatten)]
    platform: PlatformArgs,
    #[arg(
        long,
        default_value_t = 10_000,
        help = "Number of synthetic records to generate"
    )]
    count: usize,
    #[arg(
        long,
        default_value_t = 3,
        help = "Number of sample records to print"
    )]
    samples: usize,
}

#[derive(Debug, clap::Args)]
struct PlatformArgs {
    #[arg(
        long,
        default_value_t = WORKERS,
        value_parser = parse_positive_usize,
        help = "Worker threads used by parallel aggregation"
    )]
    workers: usize,
    #[arg(
        long = "cache-ttl-secs",
        default_value_t = CACHE_TTL_SECS,
        help = "Time-to-live of cached summary statistics"
    )]
    cache_ttl_secs: u64,
    #[arg(
        long = "retry-attempts",
        default_value_t = RETRY_ATTEMPTS,
        value_parser = parse_positive_usize,
        help = "Total attempts allowed for record loading"
    )]
    retry_attempts: usize,
    #[arg(
        long = "retry-delay-ms",
        default_value_t = RETRY_DELAY_MS,
        help = "Pause between load attempts"
    )]
    retry_delay_ms: u64,
    #[arg(long, help = "Optional deterministic seed")]
    seed: Option<u64>,
}

impl PlatformArgs {
    fn into_config(self, chunk_size: usize) -> AnalyticsConfig {
        AnalyticsConfig {
            chunk_size,
            workers: self.workers,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            retry: RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms)),
            seed: self.seed,
        }
    }
}

/// Run the full pipeline: load, summary, streaming, parallel analysis, export.
pub fn run_pilgrim_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<PilgrimDemoCli, _>(std::iter::once("pilgrim_demo".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    println!("{}", "=".repeat(60));
    println!("Hajj & Umrah Analytics Platform");
    println!("{}", "=".repeat(60));

    let mut platform = AnalyticsPlatform::new(cli.platform.into_config(cli.chunk_size))?;

    println!("\nStep 1: loading {} records", format_with_commas(cli.count));
    platform.load(cli.count)?;

    println!("\nStep 2: summary statistics (cached)");
    let summary = platform.summary()?;
    print_summary(&summary);

    println!(
        "\nStep 3: streaming analysis (first {} windows)",
        cli.preview_chunks
    );
    for chunk in platform.stream_analysis(cli.chunk_size)?.take(cli.preview_chunks) {
        println!(
            "   Chunk {}: {} pilgrims analyzed (avg age {:.1})",
            chunk.chunk_id, chunk.statistics.total_pilgrims, chunk.statistics.avg_age
        );
    }

    println!("\nStep 4: comprehensive parallel analysis");
    let report = platform.comprehensive_analysis()?;
    for (task, result) in &report.detailed_analysis {
        match result {
            Some(distribution) => println!("   {task}: {} categories", distribution.len()),
            None => println!("   {task}: failed"),
        }
    }

    println!("\nTop nationalities:");
    for (nationality, count) in &report.top_nationalities {
        let share = if summary.total_pilgrims == 0 {
            0.0
        } else {
            *count as f64 / summary.total_pilgrims as f64 * 100.0
        };
        println!("   {nationality}: {} ({share:.1}%)", format_with_commas(*count));
    }

    println!("\nStep 5: exporting report");
    platform.export_report(&report, &cli.output)?;
    println!("   Report written to {}", cli.output.display());

    platform.cleanup();
    println!("\n{}", "=".repeat(60));
    println!("Analysis completed successfully");
    Ok(())
}

/// Load records, print summary statistics and a few sample records.
pub fn run_basic_usage<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<BasicUsageCli, _>(std::iter::once("basic_usage".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let mut platform = AnalyticsPlatform::new(cli.platform.into_config(CHUNK_SIZE))?;
    let loaded = platform.load(cli.count)?;
    println!("Loaded {} records", format_with_commas(loaded));

    print_summary(&platform.summary()?);

    println!("\nSample records:");
    for (idx, record) in platform.records().iter().take(cli.samples).enumerate() {
        println!("\n   Record {}:", idx + 1);
        println!("      ID: {}", record.id);
        println!("      Name: {}", record.name);
        println!("      Age: {}", record.age);
        println!("      Nationality: {}", record.nationality.label());
        println!("      Type: {}", record.pilgrim_type.label());
        println!("      Health: {}", record.health_status.label());
    }

    platform.cleanup();
    Ok(())
}

fn print_summary(summary: &SummaryStatistics) {
    println!(
        "   Total pilgrims: {}",
        format_with_commas(summary.total_pilgrims)
    );
    println!(
        "   Hajj: {} | Umrah: {}",
        format_with_commas(summary.hajj_pilgrims),
        format_with_commas(summary.umrah_pilgrims)
    );
    println!("   Average age: {:.1} years", summary.average_age);
    println!(
        "   Gender: {:.1}% male, {:.1}% female",
        summary.male_percentage, summary.female_percentage
    );
}

fn format_with_commas(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
