use std::path::Path;

use tracing::info;

use crate::aggregate;
use crate::config::ReportConfig;
use crate::enrich;
use crate::error::Result;
use crate::frame;
use crate::join;
use crate::loader;
use crate::report::{
    dense_failure_breakdown, dense_hourly_cancellation_latency, dense_hourly_failure_breakdown,
    dense_hourly_mean_eta, FailureReport,
};

/// Run the whole pipeline once: load, join, enrich, aggregate, report.
///
/// Every stage takes its predecessor's output as an explicit immutable input
/// and returns a new value; there is no shared mutable table and no state
/// across invocations, so rerunning on unchanged input yields an identical
/// report.
pub fn run_report(
    orders_path: impl AsRef<Path>,
    offers_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<FailureReport> {
    config.outliers.validate()?;

    let orders = loader::load_orders(orders_path)?;
    let offers = loader::load_offers(offers_path)?;
    info!(orders = orders.len(), offers = offers.len(), "sources loaded");

    let joined = join::inner_join_on_order(&orders, &offers);
    let enriched = enrich::enrich(&joined, config.integrity)?;
    info!(
        joined = joined.len(),
        enriched = enriched.records.len(),
        skipped = enriched.skipped,
        "records enriched"
    );

    let df = frame::enriched_to_dataframe(&enriched.records)?;

    let mut failure_breakdown = aggregate::failure_breakdown(&df)?;
    let mut hourly_failure_breakdown = aggregate::hourly_failure_breakdown(&df)?;
    let mut hourly_cancellation_latency =
        aggregate::hourly_cancellation_latency(&df, &config.outliers)?;
    let mut hourly_mean_eta = aggregate::hourly_mean_eta(&df)?;

    if config.dense {
        failure_breakdown = dense_failure_breakdown(&failure_breakdown);
        hourly_failure_breakdown = dense_hourly_failure_breakdown(&hourly_failure_breakdown);
        hourly_cancellation_latency =
            dense_hourly_cancellation_latency(&hourly_cancellation_latency);
        hourly_mean_eta = dense_hourly_mean_eta(&hourly_mean_eta);
    }

    Ok(FailureReport {
        failure_breakdown,
        hourly_failure_breakdown,
        hourly_cancellation_latency,
        hourly_mean_eta,
        enriched_rows: enriched.records.len(),
        skipped_rows: enriched.skipped,
    })
}
