use tracing::warn;

use crate::config::IntegrityMode;
use crate::error::{PipelineError, Result};
use crate::loader::ORDERS_SOURCE;
use crate::model::{DriverAssignment, EnrichedOrder, JoinedRow, OrderStatus};

/// Enricher output: the decoded records plus how many joined rows were
/// dropped for integrity violations.
#[derive(Debug, Clone)]
pub struct Enriched {
    pub records: Vec<EnrichedOrder>,
    pub skipped: usize,
}

/// Decode every joined row into a typed [`EnrichedOrder`].
///
/// The raw status and assignment keys are mapped total-exhaustively through
/// their enums; an unmapped code, a malformed timestamp, or a non-numeric
/// value where a number was expected is a per-record integrity violation. In
/// [`IntegrityMode::SkipAndCount`] the offending row is warned about,
/// counted, and excluded from all downstream aggregation; in
/// [`IntegrityMode::Strict`] the first violation aborts the run.
pub fn enrich(joined: &[JoinedRow], mode: IntegrityMode) -> Result<Enriched> {
    let mut records = Vec::with_capacity(joined.len());
    let mut skipped = 0usize;

    for row in joined {
        match decode_row(row) {
            Ok(record) => records.push(record),
            Err(message) => {
                let err = PipelineError::integrity(ORDERS_SOURCE, row.order.row, message);
                match mode {
                    IntegrityMode::Strict => return Err(err),
                    IntegrityMode::SkipAndCount => {
                        warn!(offer_row = row.offer_row, "skipping record: {err}");
                        skipped += 1;
                    }
                }
            }
        }
    }

    Ok(Enriched { records, skipped })
}

fn decode_row(row: &JoinedRow) -> std::result::Result<EnrichedOrder, String> {
    let order = &row.order;

    let order_gk = parse_required_i64(order.order_gk.as_deref(), "order_gk")?;
    let offer_id = parse_required_i64(row.offer_id.as_deref(), "offer_id")?;

    let order_time = order
        .order_datetime
        .clone()
        .ok_or_else(|| "missing order_datetime".to_string())?;
    let order_hour = extract_hour(&order_time)?;

    let status_key = parse_required_i64(order.order_status_key.as_deref(), "order_status_key")?;
    let order_status = OrderStatus::from_key(status_key)?;

    let assigned_key = parse_required_i64(
        order.is_driver_assigned_key.as_deref(),
        "is_driver_assigned_key",
    )?;
    let is_driver_assigned = DriverAssignment::from_key(assigned_key)?;

    let origin_longitude = parse_optional_f64(order.origin_longitude.as_deref(), "origin_longitude")?;
    let origin_latitude = parse_optional_f64(order.origin_latitude.as_deref(), "origin_latitude")?;
    let m_order_eta =
        parse_optional_non_negative(order.m_order_eta.as_deref(), "m_order_eta")?;
    let cancellation_time_in_seconds = parse_optional_non_negative(
        order.cancellation_time_in_seconds.as_deref(),
        "cancellation_time_in_seconds",
    )?;

    Ok(EnrichedOrder {
        order_gk,
        offer_id,
        order_time,
        order_hour,
        is_driver_assigned,
        order_status,
        origin_longitude,
        origin_latitude,
        m_order_eta,
        cancellation_time_in_seconds,
    })
}

/// Split the time field on ':' and take the leading token, normalized to two
/// digits. A time with no separator or a token that is not an hour is
/// malformed.
fn extract_hour(time: &str) -> std::result::Result<String, String> {
    let (token, _) = time
        .split_once(':')
        .ok_or_else(|| format!("order_datetime '{time}' has no ':' separator"))?;
    let hour: u8 = token
        .trim()
        .parse()
        .map_err(|_| format!("order_datetime '{time}' does not start with an hour"))?;
    if hour > 23 {
        return Err(format!("order_datetime '{time}' hour {hour} out of range"));
    }
    Ok(format!("{hour:02}"))
}

fn parse_required_i64(
    value: Option<&str>,
    column: &str,
) -> std::result::Result<i64, String> {
    let value = value.ok_or_else(|| format!("missing {column}"))?;
    value
        .parse::<i64>()
        .map_err(|err| format!("failed to parse column '{column}' as integer: {err}"))
}

fn parse_optional_f64(
    value: Option<&str>,
    column: &str,
) -> std::result::Result<Option<f64>, String> {
    let Some(value) = value else {
        return Ok(None);
    };
    if value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|err| format!("failed to parse column '{column}' as float: {err}"))
}

fn parse_optional_non_negative(
    value: Option<&str>,
    column: &str,
) -> std::result::Result<Option<f64>, String> {
    match parse_optional_f64(value, column)? {
        Some(parsed) if parsed < 0.0 => {
            Err(format!("column '{column}' must be non-negative, got {parsed}"))
        }
        other => Ok(other),
    }
}
