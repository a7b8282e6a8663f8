use std::fmt;

use serde::Serialize;

/// Why a failed order ended up without a ride.
///
/// The source data encodes this as `order_status_key`: 4 for a cancellation
/// by the client, 9 for a rejection by the matching system. These are the
/// only two codes that occur; anything else is a data integrity violation,
/// never a silent third category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OrderStatus {
    #[serde(rename = "Client Cancelled")]
    ClientCancelled,
    #[serde(rename = "System Reject")]
    SystemReject,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 2] = [OrderStatus::ClientCancelled, OrderStatus::SystemReject];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::ClientCancelled => "Client Cancelled",
            OrderStatus::SystemReject => "System Reject",
        }
    }

    pub fn from_key(key: i64) -> Result<Self, String> {
        match key {
            4 => Ok(OrderStatus::ClientCancelled),
            9 => Ok(OrderStatus::SystemReject),
            other => Err(format!("unmapped order_status_key '{other}'")),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        OrderStatus::ALL.iter().copied().find(|s| s.as_str() == label)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a driver had been assigned when the order failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DriverAssignment {
    #[serde(rename = "No")]
    No,
    #[serde(rename = "Yes")]
    Yes,
}

impl DriverAssignment {
    pub const ALL: [DriverAssignment; 2] = [DriverAssignment::No, DriverAssignment::Yes];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverAssignment::No => "No",
            DriverAssignment::Yes => "Yes",
        }
    }

    pub fn from_key(key: i64) -> Result<Self, String> {
        match key {
            0 => Ok(DriverAssignment::No),
            1 => Ok(DriverAssignment::Yes),
            other => Err(format!("unmapped is_driver_assigned_key '{other}'")),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        DriverAssignment::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == label)
    }
}

impl fmt::Display for DriverAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw order row, exactly as loaded: every field is trimmed text, empty
/// cells are absent. Decoding happens in the enricher so that a corrupt row
/// can be skipped without aborting the whole batch.
#[derive(Debug, Clone)]
pub struct RawOrder {
    pub order_gk: Option<String>,
    pub order_datetime: Option<String>,
    pub origin_longitude: Option<String>,
    pub origin_latitude: Option<String>,
    pub m_order_eta: Option<String>,
    pub order_status_key: Option<String>,
    pub is_driver_assigned_key: Option<String>,
    pub cancellation_time_in_seconds: Option<String>,
    /// 1-based data row in the source CSV, for diagnostics.
    pub row: usize,
}

/// One raw offer row: the (order, offer) identifier pairing.
#[derive(Debug, Clone)]
pub struct RawOffer {
    pub order_gk: Option<String>,
    pub offer_id: Option<String>,
    pub row: usize,
}

/// An (order, offer) pair that survived the inner join. Still raw text;
/// carries both source row numbers.
#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub order: RawOrder,
    pub offer_id: Option<String>,
    pub offer_row: usize,
}

/// A fully decoded record, one per surviving (order, offer) pair. Immutable
/// once built; every aggregator reads the same collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedOrder {
    pub order_gk: i64,
    pub offer_id: i64,
    pub order_time: String,
    /// Leading token of `order_time` before the first ':', normalized to two
    /// digits, always one of "00".."23".
    pub order_hour: String,
    pub is_driver_assigned: DriverAssignment,
    pub order_status: OrderStatus,
    pub origin_longitude: Option<f64>,
    pub origin_latitude: Option<f64>,
    pub m_order_eta: Option<f64>,
    pub cancellation_time_in_seconds: Option<f64>,
}

/// All 24 hour labels in order, the dense axis for hourly reports.
pub fn hour_labels() -> impl Iterator<Item = String> {
    (0u8..24).map(|h| format!("{h:02}"))
}
