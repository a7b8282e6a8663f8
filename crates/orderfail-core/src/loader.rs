use std::path::Path;

use csv::StringRecord;

use crate::error::{PipelineError, Result, SourceError};
use crate::model::{RawOffer, RawOrder};

pub const ORDERS_SOURCE: &str = "data_orders";
pub const OFFERS_SOURCE: &str = "data_offers";

/// Read the orders CSV, preserving row order and all consumed columns as raw
/// trimmed text. No validation happens here beyond CSV well-formedness and
/// required-header presence; a source that cannot be read aborts the run.
pub fn load_orders(path: impl AsRef<Path>) -> Result<Vec<RawOrder>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .map_err(|err| PipelineError::unavailable(ORDERS_SOURCE, err))?;

    let headers = reader
        .headers()
        .map_err(|err| PipelineError::unavailable(ORDERS_SOURCE, err))?
        .clone();

    let order_gk = required_column(ORDERS_SOURCE, &headers, &["order_gk"])?;
    let order_datetime = required_column(ORDERS_SOURCE, &headers, &["order_datetime"])?;
    let origin_longitude = required_column(ORDERS_SOURCE, &headers, &["origin_longitude"])?;
    let origin_latitude = required_column(ORDERS_SOURCE, &headers, &["origin_latitude"])?;
    let m_order_eta = required_column(ORDERS_SOURCE, &headers, &["m_order_eta"])?;
    let order_status_key = required_column(ORDERS_SOURCE, &headers, &["order_status_key"])?;
    let is_driver_assigned_key =
        required_column(ORDERS_SOURCE, &headers, &["is_driver_assigned_key"])?;
    // The upstream data description and the actual export disagree on this
    // header, so both spellings are accepted.
    let cancellation_seconds = required_column(
        ORDERS_SOURCE,
        &headers,
        &[
            "cancellations_time_in_seconds",
            "cancellation_time_in_seconds",
        ],
    )?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| PipelineError::unavailable(ORDERS_SOURCE, err))?;
        rows.push(RawOrder {
            order_gk: cell(&record, order_gk),
            order_datetime: cell(&record, order_datetime),
            origin_longitude: cell(&record, origin_longitude),
            origin_latitude: cell(&record, origin_latitude),
            m_order_eta: cell(&record, m_order_eta),
            order_status_key: cell(&record, order_status_key),
            is_driver_assigned_key: cell(&record, is_driver_assigned_key),
            cancellation_time_in_seconds: cell(&record, cancellation_seconds),
            row: idx + 1,
        });
    }

    Ok(rows)
}

/// Read the offers CSV: the (order_gk, offer_id) pairing used to restrict
/// orders to those that received at least one offer.
pub fn load_offers(path: impl AsRef<Path>) -> Result<Vec<RawOffer>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .map_err(|err| PipelineError::unavailable(OFFERS_SOURCE, err))?;

    let headers = reader
        .headers()
        .map_err(|err| PipelineError::unavailable(OFFERS_SOURCE, err))?
        .clone();

    let order_gk = required_column(OFFERS_SOURCE, &headers, &["order_gk"])?;
    let offer_id = required_column(OFFERS_SOURCE, &headers, &["offer_id"])?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| PipelineError::unavailable(OFFERS_SOURCE, err))?;
        rows.push(RawOffer {
            order_gk: cell(&record, order_gk),
            offer_id: cell(&record, offer_id),
            row: idx + 1,
        });
    }

    Ok(rows)
}

fn required_column(
    source: &'static str,
    headers: &StringRecord,
    names: &[&str],
) -> Result<usize> {
    for name in names {
        if let Some(idx) = headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
        {
            return Ok(idx);
        }
    }
    Err(PipelineError::unavailable(
        source,
        SourceError::MissingColumn(names[0].to_string()),
    ))
}

fn cell(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
