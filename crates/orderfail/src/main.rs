use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use orderfail_core::{
    FailureReport, IntegrityMode, OutlierPolicy, ReportConfig, run_report,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Report on failed ride-hailing orders: failure-reason distribution, hourly
/// failure distribution, mean time to cancellation, and mean ETA.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the orders CSV
    #[arg(long)]
    orders: PathBuf,

    /// Path to the offers CSV
    #[arg(long)]
    offers: PathBuf,

    /// Optional TOML report configuration; command-line flags take priority
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort on the first malformed record instead of skipping and counting
    #[arg(long)]
    strict: bool,

    /// Report every hour/category combination, zero-filling absent ones
    #[arg(long)]
    dense: bool,

    /// Emit the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Drop cancellation latencies above this many seconds before averaging
    #[arg(long, conflicts_with = "outlier_std_devs")]
    max_cancellation_seconds: Option<f64>,

    /// Drop latencies beyond this many standard deviations from the mean
    #[arg(long)]
    outlier_std_devs: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    info!(?config, "running failed-order report");

    let report = run_report(&cli.orders, &cli.offers, &config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    render(&report);
    Ok(())
}

/// Start from the TOML file when given, then let flags override it.
fn resolve_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        }
        None => ReportConfig::default(),
    };

    if cli.strict {
        config.integrity = IntegrityMode::Strict;
    }
    if cli.dense {
        config.dense = true;
    }
    if let Some(threshold) = cli.max_cancellation_seconds {
        config.outliers = OutlierPolicy::MaxSeconds(threshold);
    } else if let Some(devs) = cli.outlier_std_devs {
        config.outliers = OutlierPolicy::StdDevsFromMean(devs);
    }

    Ok(config)
}

fn render(report: &FailureReport) {
    let mut breakdown = Table::new();
    breakdown
        .load_preset(UTF8_FULL)
        .set_header(["Driver assigned", "Order status", "Orders"]);
    for row in &report.failure_breakdown {
        breakdown.add_row([
            row.is_driver_assigned.as_str().to_string(),
            row.order_status.as_str().to_string(),
            row.orders.to_string(),
        ]);
    }

    let mut hourly = Table::new();
    hourly
        .load_preset(UTF8_FULL)
        .set_header(["Hour", "Driver assigned", "Order status", "Orders"]);
    for row in &report.hourly_failure_breakdown {
        hourly.add_row([
            row.order_hour.clone(),
            row.is_driver_assigned.as_str().to_string(),
            row.order_status.as_str().to_string(),
            row.orders.to_string(),
        ]);
    }

    let mut latency = Table::new();
    latency
        .load_preset(UTF8_FULL)
        .set_header(["Hour", "Driver assigned", "Mean cancellation (s)", "Samples"]);
    for row in &report.hourly_cancellation_latency {
        latency.add_row([
            row.order_hour.clone(),
            row.is_driver_assigned.as_str().to_string(),
            format_mean(row.mean_seconds),
            row.samples.to_string(),
        ]);
    }

    let mut eta = Table::new();
    eta.load_preset(UTF8_FULL)
        .set_header(["Hour", "Mean ETA", "Samples"]);
    for row in &report.hourly_mean_eta {
        eta.add_row([
            row.order_hour.clone(),
            format_mean(row.mean_eta),
            row.samples.to_string(),
        ]);
    }

    println!("Failure reasons");
    println!("{breakdown}\n");
    println!("Failures by hour");
    println!("{hourly}\n");
    println!("Mean time to cancellation by hour");
    println!("{latency}\n");
    println!("Mean ETA by hour");
    println!("{eta}\n");
    println!(
        "{} enriched rows aggregated, {} skipped for integrity violations",
        report.enriched_rows, report.skipped_rows
    );
}

fn format_mean(value: Option<f64>) -> String {
    match value {
        Some(mean) => format!("{mean:.1}"),
        None => "-".to_string(),
    }
}
