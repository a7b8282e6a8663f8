use polars::prelude::*;

use crate::error::Result;
use crate::model::EnrichedOrder;

pub const COL_ORDER_GK: &str = "order_gk";
pub const COL_OFFER_ID: &str = "offer_id";
pub const COL_ORDER_TIME: &str = "order_time";
pub const COL_ORDER_HOUR: &str = "order_hour";
pub const COL_DRIVER_ASSIGNED: &str = "is_driver_assigned";
pub const COL_ORDER_STATUS: &str = "order_status";
pub const COL_LONGITUDE: &str = "origin_longitude";
pub const COL_LATITUDE: &str = "origin_latitude";
pub const COL_ETA: &str = "m_order_eta";
pub const COL_CANCELLATION_SECONDS: &str = "cancellation_time_in_seconds";

/// Build the one shared DataFrame the four aggregators read. The frame is
/// never mutated downstream; every aggregator produces its own output table.
pub fn enriched_to_dataframe(records: &[EnrichedOrder]) -> Result<DataFrame> {
    let capacity = records.len();

    let mut order_gk = Vec::with_capacity(capacity);
    let mut offer_id = Vec::with_capacity(capacity);
    let mut order_time = Vec::with_capacity(capacity);
    let mut order_hour = Vec::with_capacity(capacity);
    let mut assigned = Vec::with_capacity(capacity);
    let mut status = Vec::with_capacity(capacity);
    let mut longitude = Vec::with_capacity(capacity);
    let mut latitude = Vec::with_capacity(capacity);
    let mut eta = Vec::with_capacity(capacity);
    let mut cancellation = Vec::with_capacity(capacity);

    for record in records {
        order_gk.push(record.order_gk);
        offer_id.push(record.offer_id);
        order_time.push(record.order_time.as_str());
        order_hour.push(record.order_hour.as_str());
        assigned.push(record.is_driver_assigned.as_str());
        status.push(record.order_status.as_str());
        longitude.push(record.origin_longitude);
        latitude.push(record.origin_latitude);
        eta.push(record.m_order_eta);
        cancellation.push(record.cancellation_time_in_seconds);
    }

    let columns: Vec<Column> = vec![
        Series::new(COL_ORDER_GK.into(), order_gk).into(),
        Series::new(COL_OFFER_ID.into(), offer_id).into(),
        Series::new(COL_ORDER_TIME.into(), order_time).into(),
        Series::new(COL_ORDER_HOUR.into(), order_hour).into(),
        Series::new(COL_DRIVER_ASSIGNED.into(), assigned).into(),
        Series::new(COL_ORDER_STATUS.into(), status).into(),
        Series::new(COL_LONGITUDE.into(), longitude).into(),
        Series::new(COL_LATITUDE.into(), latitude).into(),
        Series::new(COL_ETA.into(), eta).into(),
        Series::new(COL_CANCELLATION_SECONDS.into(), cancellation).into(),
    ];

    Ok(DataFrame::new(columns)?)
}
