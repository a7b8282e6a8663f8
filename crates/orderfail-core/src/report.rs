use serde::Serialize;

use crate::model::{hour_labels, DriverAssignment, OrderStatus};

/// Aggregator A: orders per (driver-assigned, order-status) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureBreakdownRow {
    pub is_driver_assigned: DriverAssignment,
    pub order_status: OrderStatus,
    pub orders: u32,
}

/// Aggregator B: orders per (hour, driver-assigned, order-status) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyFailureRow {
    pub order_hour: String,
    pub is_driver_assigned: DriverAssignment,
    pub order_status: OrderStatus,
    pub orders: u32,
}

/// Aggregator C: mean cancellation latency per (hour, driver-assigned).
/// `mean_seconds` is absent when the group had no qualifying latency value;
/// a missing group average is a real, representable state, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancellationLatencyRow {
    pub order_hour: String,
    pub is_driver_assigned: DriverAssignment,
    pub mean_seconds: Option<f64>,
    /// Latency values that survived outlier exclusion and fed the mean.
    pub samples: u32,
}

/// Aggregator D: mean ETA per hour, absent ETAs ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEtaRow {
    pub order_hour: String,
    pub mean_eta: Option<f64>,
    pub samples: u32,
}

/// The four aggregated tables handed to the reporting collaborator, plus the
/// record accounting the caller needs to judge data quality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub failure_breakdown: Vec<FailureBreakdownRow>,
    pub hourly_failure_breakdown: Vec<HourlyFailureRow>,
    pub hourly_cancellation_latency: Vec<CancellationLatencyRow>,
    pub hourly_mean_eta: Vec<HourlyEtaRow>,
    /// Rows that survived join and enrichment and fed the aggregations.
    pub enriched_rows: usize,
    /// Rows dropped for integrity violations in skip-and-count mode.
    pub skipped_rows: usize,
}

/// Expand a sparse breakdown to all four category combinations, reporting
/// zero for combinations that never occurred.
pub fn dense_failure_breakdown(sparse: &[FailureBreakdownRow]) -> Vec<FailureBreakdownRow> {
    let mut dense = Vec::with_capacity(4);
    for assigned in DriverAssignment::ALL {
        for status in OrderStatus::ALL {
            let orders = sparse
                .iter()
                .find(|row| row.is_driver_assigned == assigned && row.order_status == status)
                .map_or(0, |row| row.orders);
            dense.push(FailureBreakdownRow {
                is_driver_assigned: assigned,
                order_status: status,
                orders,
            });
        }
    }
    dense
}

/// Expand a sparse hourly breakdown to the full 24x4 matrix.
pub fn dense_hourly_failure_breakdown(sparse: &[HourlyFailureRow]) -> Vec<HourlyFailureRow> {
    let mut dense = Vec::with_capacity(24 * 4);
    for hour in hour_labels() {
        for assigned in DriverAssignment::ALL {
            for status in OrderStatus::ALL {
                let orders = sparse
                    .iter()
                    .find(|row| {
                        row.order_hour == hour
                            && row.is_driver_assigned == assigned
                            && row.order_status == status
                    })
                    .map_or(0, |row| row.orders);
                dense.push(HourlyFailureRow {
                    order_hour: hour.clone(),
                    is_driver_assigned: assigned,
                    order_status: status,
                    orders,
                });
            }
        }
    }
    dense
}

/// Expand a sparse latency table to all 24x2 groups; groups with no
/// qualifying records report a missing mean and zero samples.
pub fn dense_hourly_cancellation_latency(
    sparse: &[CancellationLatencyRow],
) -> Vec<CancellationLatencyRow> {
    let mut dense = Vec::with_capacity(24 * 2);
    for hour in hour_labels() {
        for assigned in DriverAssignment::ALL {
            let found = sparse
                .iter()
                .find(|row| row.order_hour == hour && row.is_driver_assigned == assigned);
            dense.push(CancellationLatencyRow {
                order_hour: hour.clone(),
                is_driver_assigned: assigned,
                mean_seconds: found.and_then(|row| row.mean_seconds),
                samples: found.map_or(0, |row| row.samples),
            });
        }
    }
    dense
}

/// Expand a sparse ETA table to all 24 hours.
pub fn dense_hourly_mean_eta(sparse: &[HourlyEtaRow]) -> Vec<HourlyEtaRow> {
    let mut dense = Vec::with_capacity(24);
    for hour in hour_labels() {
        let found = sparse.iter().find(|row| row.order_hour == hour);
        dense.push(HourlyEtaRow {
            order_hour: hour.clone(),
            mean_eta: found.and_then(|row| row.mean_eta),
            samples: found.map_or(0, |row| row.samples),
        });
    }
    dense
}
