//! eventscope - explore the time structure of a CSV event log
//!
//! Detects the timestamp column, resolves every row in the chosen timezone
//! and prints hour-of-day, weekday and daily breakdowns.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/eventscope/eventscope.log.YYYY-MM-DD (~/.local/state/eventscope/), one file per UTC day
//! - Config: $XDG_CONFIG_HOME/eventscope/config.toml (~/.config/eventscope/config.toml)

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use eventscope_core::aggregate::{self, hour_display, weekday_name, Statistics, TimestampSummary};
use eventscope_core::{csv_input, Config, Pipeline, PipelineOutput, Timezone};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eventscope")]
#[command(about = "Explore the time structure of a CSV event log")]
#[command(version)]
struct Args {
    /// CSV file with a header row
    #[arg(required_unless_present = "list_timezones")]
    file: Option<PathBuf>,

    /// IANA timezone for timestamps without an offset (default: config, then local)
    #[arg(short, long)]
    timezone: Option<String>,

    /// Maximum rows kept in the sample
    #[arg(long)]
    sample_cap: Option<usize>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Run on the calling thread instead of a worker thread
    #[arg(long)]
    in_process: bool,

    /// Verbose output (-v sample details, -vv daily table)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// List known timezone identifiers and exit
    #[arg(long)]
    list_timezones: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_timezones {
        for id in Timezone::known_ids() {
            println!("{}", id);
        }
        return Ok(());
    }

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        eventscope_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("eventscope starting");

    let mut settings = config.pipeline.clone();
    if let Some(tz) = &args.timezone {
        if Timezone::parse_strict(tz).is_err() {
            eprintln!("Unknown timezone '{}', using local time", tz);
        }
        settings.timezone = tz.clone();
    }
    if let Some(cap) = args.sample_cap {
        settings.sample_cap = cap.max(1);
    }

    let path = args.file.as_deref().context("no input file given")?;
    let rows = csv_input::read_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pipeline = Pipeline::new(settings.to_pipeline_config());
    let output = run_pipeline(&pipeline, rows, args.in_process)
        .with_context(|| format!("failed to analyze {}", path.display()))?;

    tracing::info!(
        column = %output.column,
        rows_used = output.rows_used,
        rows_read = output.rows_read,
        "Analysis complete"
    );

    let statistics = aggregate::summarize(&output.dataset.values());
    let events = output.dataset.timestamp_summary();

    if args.format == "json" {
        print_json(&output, statistics, events)?;
    } else {
        let source = path.display().to_string();
        let summary = Summary { statistics, events };
        print_text(&source, &output, &summary, &args, settings.subset_points);
    }

    Ok(())
}

/// Run with a progress bar, on a worker thread unless `in_process`.
fn run_pipeline(
    pipeline: &Pipeline,
    rows: Vec<eventscope_core::RawRow>,
    in_process: bool,
) -> Result<PipelineOutput> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
            .context("invalid progress bar template")?
            .progress_chars("#>-"),
    );
    pb.set_message("ingesting");

    let on_progress = |percent: u8| pb.set_position(u64::from(percent));

    let result = if in_process {
        pipeline.run_with_progress(rows, on_progress)
    } else {
        pipeline
            .spawn(rows)
            .context("failed to start worker")?
            .wait_with_progress(on_progress)
    };

    pb.finish_and_clear();
    Ok(result?)
}

/// Whole-dataset figures printed under the header.
struct Summary {
    statistics: Option<Statistics>,
    /// Present only when no row had a numeric value
    events: Option<TimestampSummary>,
}

fn print_json(
    output: &PipelineOutput,
    statistics: Option<Statistics>,
    events: Option<TimestampSummary>,
) -> Result<()> {
    let mut value = output.to_json()?;
    value["statistics"] = serde_json::to_value(statistics)?;
    value["events"] = serde_json::to_value(events)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_text(
    source: &str,
    output: &PipelineOutput,
    summary: &Summary,
    args: &Args,
    subset_points: usize,
) {
    let dataset = &output.dataset;

    println!("File: {}", source);
    if output.rows_read == 0 {
        println!("No rows to analyze.");
        return;
    }

    println!("Datetime column: {}", output.column);
    println!("Timezone: {}", output.timezone);
    println!(
        "{} of {} rows used ({} dropped)",
        output.rows_used, output.rows_read, output.rows_dropped
    );

    let zone = Timezone::from_id(&output.timezone);
    if let (Some(first), Some(last)) = (dataset.full.first(), dataset.full.last()) {
        println!(
            "Range: {} → {}",
            zone.render(first.timestamp, "%Y-%m-%d %H:%M:%S"),
            zone.render(last.timestamp, "%Y-%m-%d %H:%M:%S")
        );
    }

    if let Some(events) = &summary.events {
        println!("\nEvents:");
        println!("  Total events:     {}", events.total_events);
        println!(
            "  First event:      {}",
            zone.render(events.first_event, "%Y-%m-%d %H:%M:%S")
        );
        println!(
            "  Last event:       {}",
            zone.render(events.last_event, "%Y-%m-%d %H:%M:%S")
        );
        println!(
            "  Average interval: {}",
            format_interval(events.avg_interval_seconds)
        );
        println!("  Events per hour:  {:.1}", events.events_per_hour);
    } else if let Some(stats) = &summary.statistics {
        println!("\nValues:");
        println!("  Count:   {}", stats.count);
        println!("  Sum:     {}", format_value(stats.sum));
        println!("  Mean:    {}", format_value(stats.mean));
        println!("  Median:  {}", format_value(stats.median));
        println!("  Min:     {}", format_value(stats.min));
        println!("  Max:     {}", format_value(stats.max));
        println!("  Std dev: {}", format_value(stats.std_dev));
        println!(
            "  Q1/Q3:   {} / {}",
            format_value(stats.q1),
            format_value(stats.q3)
        );
    }

    if !dataset.hourly.is_empty() {
        println!("\nBy hour:");
        for (hour, bucket) in &dataset.hourly {
            println!(
                "  {:<12} {:>8}  avg {}",
                hour_display(*hour),
                bucket.count,
                format_value(bucket.avg_value)
            );
        }
    }

    if !dataset.weekly.is_empty() {
        println!("\nBy weekday:");
        for (day, bucket) in &dataset.weekly {
            println!(
                "  {:<12} {:>8}  avg {}",
                weekday_name(*day),
                bucket.count,
                format_value(bucket.avg_value)
            );
        }
    }

    if let Some(hour) = dataset.peak_hour() {
        println!("\nPeak hour: {}", hour_display(hour));
    }
    if let Some(day) = dataset.busiest_weekday() {
        println!("Busiest weekday: {}", weekday_name(day));
    }

    if args.verbose >= 1 {
        println!(
            "\nSample: {} of {} rows",
            dataset.sampled.len(),
            dataset.full.len()
        );
        println!(
            "Subset: {} points (budget {})",
            aggregate::subset(&dataset.full, subset_points).len(),
            subset_points
        );
        let windows = aggregate::aggregate_by_window(&dataset.full, chrono::Duration::hours(1));
        if let Some(busiest) = windows.iter().max_by_key(|w| w.count) {
            println!(
                "Busiest hour window: {} ({} rows, avg {})",
                zone.render(busiest.start, "%Y-%m-%d %H:%M"),
                busiest.count,
                format_value(busiest.avg_value)
            );
        }
    }

    if args.verbose >= 2 {
        println!("\nBy day:");
        for (date, bucket) in &dataset.daily {
            println!(
                "  {:<12} {:>8}  avg {}",
                date,
                bucket.count,
                format_value(bucket.avg_value)
            );
        }
    }
}

/// Whole seconds as `1h 5m 0s`, `5m 30s` or `42s`.
fn format_interval(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as i64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Integral values print without decimals, others with two.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
