//! The four reporting aggregations. Each is a pure function of the shared
//! enriched frame and its configuration; only four fixed reports exist, so
//! each is named and statically specified rather than routed through a
//! generic group-by utility.

use polars::prelude::*;

use crate::config::OutlierPolicy;
use crate::error::{PipelineError, Result};
use crate::frame::{COL_CANCELLATION_SECONDS, COL_DRIVER_ASSIGNED, COL_ETA, COL_ORDER_HOUR, COL_ORDER_STATUS};
use crate::model::{DriverAssignment, OrderStatus};
use crate::report::{CancellationLatencyRow, FailureBreakdownRow, HourlyEtaRow, HourlyFailureRow};

const COL_ORDERS: &str = "orders";
const COL_MEAN_SECONDS: &str = "mean_seconds";
const COL_MEAN_ETA: &str = "mean_eta";
const COL_SAMPLES: &str = "samples";

/// Aggregator A: count per (driver-assigned, order-status) pair.
///
/// Sparse group-by semantics: only combinations that occur appear here, with
/// their true counts. Rows are sorted by their group keys so reruns on
/// unchanged input are byte-identical.
pub fn failure_breakdown(df: &DataFrame) -> Result<Vec<FailureBreakdownRow>> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(COL_DRIVER_ASSIGNED), col(COL_ORDER_STATUS)])
        .agg([len().alias(COL_ORDERS)])
        .sort([COL_DRIVER_ASSIGNED, COL_ORDER_STATUS], Default::default())
        .collect()?;

    let assigned = out.column(COL_DRIVER_ASSIGNED)?.str()?;
    let status = out.column(COL_ORDER_STATUS)?.str()?;
    let orders = out.column(COL_ORDERS)?.u32()?;

    let mut rows = Vec::with_capacity(out.height());
    for idx in 0..out.height() {
        rows.push(FailureBreakdownRow {
            is_driver_assigned: assignment_from_label(assigned.get(idx))?,
            order_status: status_from_label(status.get(idx))?,
            orders: orders.get(idx).unwrap_or(0),
        });
    }
    Ok(rows)
}

/// Aggregator B: count per (hour, driver-assigned, order-status) triple.
///
/// Sparse like aggregator A; the output is sufficient to reconstruct the
/// dense 24x4 hour/category matrix (see `report::dense_hourly_failure_breakdown`).
pub fn hourly_failure_breakdown(df: &DataFrame) -> Result<Vec<HourlyFailureRow>> {
    let out = df
        .clone()
        .lazy()
        .group_by([
            col(COL_ORDER_HOUR),
            col(COL_DRIVER_ASSIGNED),
            col(COL_ORDER_STATUS),
        ])
        .agg([len().alias(COL_ORDERS)])
        .sort(
            [COL_ORDER_HOUR, COL_DRIVER_ASSIGNED, COL_ORDER_STATUS],
            Default::default(),
        )
        .collect()?;

    let hour = out.column(COL_ORDER_HOUR)?.str()?;
    let assigned = out.column(COL_DRIVER_ASSIGNED)?.str()?;
    let status = out.column(COL_ORDER_STATUS)?.str()?;
    let orders = out.column(COL_ORDERS)?.u32()?;

    let mut rows = Vec::with_capacity(out.height());
    for idx in 0..out.height() {
        rows.push(HourlyFailureRow {
            order_hour: required_hour(hour.get(idx))?,
            is_driver_assigned: assignment_from_label(assigned.get(idx))?,
            order_status: status_from_label(status.get(idx))?,
            orders: orders.get(idx).unwrap_or(0),
        });
    }
    Ok(rows)
}

/// Aggregator C: mean cancellation latency per (hour, driver-assigned).
///
/// Absent latencies never feed the mean, and values excluded by the outlier
/// policy are treated as absent, so a group whose every latency is missing
/// or excluded survives with a missing mean rather than reporting zero.
pub fn hourly_cancellation_latency(
    df: &DataFrame,
    policy: &OutlierPolicy,
) -> Result<Vec<CancellationLatencyRow>> {
    policy.validate()?;
    let latency = latency_expr(df, policy)?;

    let out = df
        .clone()
        .lazy()
        .group_by([col(COL_ORDER_HOUR), col(COL_DRIVER_ASSIGNED)])
        .agg([
            latency.clone().mean().alias(COL_MEAN_SECONDS),
            latency.count().alias(COL_SAMPLES),
        ])
        .sort([COL_ORDER_HOUR, COL_DRIVER_ASSIGNED], Default::default())
        .collect()?;

    let hour = out.column(COL_ORDER_HOUR)?.str()?;
    let assigned = out.column(COL_DRIVER_ASSIGNED)?.str()?;
    let mean = out.column(COL_MEAN_SECONDS)?.f64()?;
    let samples = out.column(COL_SAMPLES)?.u32()?;

    let mut rows = Vec::with_capacity(out.height());
    for idx in 0..out.height() {
        rows.push(CancellationLatencyRow {
            order_hour: required_hour(hour.get(idx))?,
            is_driver_assigned: assignment_from_label(assigned.get(idx))?,
            mean_seconds: mean.get(idx),
            samples: samples.get(idx).unwrap_or(0),
        });
    }
    Ok(rows)
}

/// Aggregator D: mean ETA per hour, absent ETAs ignored (never counted as
/// zero). An hour whose every ETA is absent reports a missing mean.
pub fn hourly_mean_eta(df: &DataFrame) -> Result<Vec<HourlyEtaRow>> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(COL_ORDER_HOUR)])
        .agg([
            col(COL_ETA).mean().alias(COL_MEAN_ETA),
            col(COL_ETA).count().alias(COL_SAMPLES),
        ])
        .sort([COL_ORDER_HOUR], Default::default())
        .collect()?;

    let hour = out.column(COL_ORDER_HOUR)?.str()?;
    let mean = out.column(COL_MEAN_ETA)?.f64()?;
    let samples = out.column(COL_SAMPLES)?.u32()?;

    let mut rows = Vec::with_capacity(out.height());
    for idx in 0..out.height() {
        rows.push(HourlyEtaRow {
            order_hour: required_hour(hour.get(idx))?,
            mean_eta: mean.get(idx),
            samples: samples.get(idx).unwrap_or(0),
        });
    }
    Ok(rows)
}

/// The latency column with the outlier policy applied: excluded values
/// become nulls so the group structure is untouched.
fn latency_expr(df: &DataFrame, policy: &OutlierPolicy) -> Result<Expr> {
    let latency = col(COL_CANCELLATION_SECONDS);
    match policy {
        OutlierPolicy::None => Ok(latency),
        OutlierPolicy::MaxSeconds(threshold) => Ok(when(latency.clone().lt_eq(lit(*threshold)))
            .then(latency)
            .otherwise(lit(NULL))),
        OutlierPolicy::StdDevsFromMean(devs) => {
            let stats = df
                .clone()
                .lazy()
                .select([
                    col(COL_CANCELLATION_SECONDS).mean().alias("global_mean"),
                    col(COL_CANCELLATION_SECONDS).std(1).alias("global_std"),
                ])
                .collect()?;
            let mean = stats.column("global_mean")?.f64()?.get(0);
            let std = stats.column("global_std")?.f64()?.get(0);

            match (mean, std) {
                (Some(mean), Some(std)) if std > 0.0 => {
                    let lo = mean - devs * std;
                    let hi = mean + devs * std;
                    Ok(
                        when(latency.clone().gt_eq(lit(lo)).and(latency.clone().lt_eq(lit(hi))))
                            .then(latency)
                            .otherwise(lit(NULL)),
                    )
                }
                // Too few or identical latencies to estimate spread; keep all.
                _ => Ok(latency),
            }
        }
    }
}

fn assignment_from_label(value: Option<&str>) -> Result<DriverAssignment> {
    value
        .and_then(DriverAssignment::from_label)
        .ok_or_else(|| {
            PipelineError::Report(format!("unexpected is_driver_assigned label {value:?}"))
        })
}

fn status_from_label(value: Option<&str>) -> Result<OrderStatus> {
    value
        .and_then(OrderStatus::from_label)
        .ok_or_else(|| PipelineError::Report(format!("unexpected order_status label {value:?}")))
}

fn required_hour(value: Option<&str>) -> Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Report("null order_hour group key".to_string()))
}
