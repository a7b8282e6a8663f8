use std::path::PathBuf;

use crate::aggregate::{
    failure_breakdown, hourly_cancellation_latency, hourly_failure_breakdown, hourly_mean_eta,
};
use crate::config::{IntegrityMode, OutlierPolicy, ReportConfig};
use crate::enrich::enrich;
use crate::error::PipelineError;
use crate::frame::enriched_to_dataframe;
use crate::join::inner_join_on_order;
use crate::loader::{load_offers, load_orders};
use crate::model::{DriverAssignment, JoinedRow, OrderStatus, RawOrder};
use crate::pipeline::run_report;
use crate::report::{
    dense_failure_breakdown, dense_hourly_cancellation_latency, dense_hourly_failure_breakdown,
    dense_hourly_mean_eta,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn enriched_fixture_frame() -> polars::prelude::DataFrame {
    let orders = load_orders(fixture("data_orders.csv")).expect("orders fixture");
    let offers = load_offers(fixture("data_offers.csv")).expect("offers fixture");
    let joined = inner_join_on_order(&orders, &offers);
    let enriched = enrich(&joined, IntegrityMode::SkipAndCount).expect("enrich fixture");
    assert_eq!(enriched.skipped, 0);
    enriched_to_dataframe(&enriched.records).expect("frame")
}

fn raw_order(
    gk: &str,
    time: Option<&str>,
    status: &str,
    assigned: &str,
    eta: Option<&str>,
    cancel: Option<&str>,
    row: usize,
) -> RawOrder {
    RawOrder {
        order_gk: Some(gk.to_string()),
        order_datetime: time.map(str::to_string),
        origin_longitude: Some("30.0".to_string()),
        origin_latitude: Some("59.9".to_string()),
        m_order_eta: eta.map(str::to_string),
        order_status_key: Some(status.to_string()),
        is_driver_assigned_key: Some(assigned.to_string()),
        cancellation_time_in_seconds: cancel.map(str::to_string),
        row,
    }
}

fn joined(order: RawOrder, offer_id: &str) -> JoinedRow {
    JoinedRow {
        order,
        offer_id: Some(offer_id.to_string()),
        offer_row: 1,
    }
}

#[test]
fn join_keeps_only_shared_keys_and_amplifies_multi_offer_orders() {
    let orders = load_orders(fixture("data_orders.csv")).unwrap();
    let offers = load_offers(fixture("data_offers.csv")).unwrap();
    assert_eq!(orders.len(), 6);
    assert_eq!(offers.len(), 7);

    let joined = inner_join_on_order(&orders, &offers);
    // 1006 never received an offer, offer 506 points at no order, and 1003
    // received two offers.
    assert_eq!(joined.len(), 6);

    let keys: Vec<&str> = joined
        .iter()
        .map(|row| row.order.order_gk.as_deref().unwrap())
        .collect();
    assert_eq!(keys, ["1001", "1002", "1003", "1003", "1004", "1005"]);
    assert!(!keys.contains(&"1006"));
}

#[test]
fn enrichment_labels_are_total() {
    let orders = load_orders(fixture("data_orders.csv")).unwrap();
    let offers = load_offers(fixture("data_offers.csv")).unwrap();
    let joined = inner_join_on_order(&orders, &offers);
    let enriched = enrich(&joined, IntegrityMode::SkipAndCount).unwrap();

    assert_eq!(enriched.records.len(), 6);
    for record in &enriched.records {
        assert!(matches!(
            record.is_driver_assigned,
            DriverAssignment::Yes | DriverAssignment::No
        ));
        assert!(matches!(
            record.order_status,
            OrderStatus::ClientCancelled | OrderStatus::SystemReject
        ));
        assert_eq!(record.order_hour.len(), 2);
        let hour: u8 = record.order_hour.parse().unwrap();
        assert!(hour < 24);
    }
}

#[test]
fn enrichment_normalizes_single_digit_hours() {
    let rows = vec![joined(
        raw_order("1", Some("7:05:00"), "4", "1", None, None, 1),
        "10",
    )];
    let enriched = enrich(&rows, IntegrityMode::Strict).unwrap();
    assert_eq!(enriched.records[0].order_hour, "07");
    assert_eq!(enriched.records[0].order_time, "7:05:00");
}

#[test]
fn unmapped_status_code_is_skipped_and_counted_by_default() {
    let orders = load_orders(fixture("data_orders_bad_status.csv")).unwrap();
    let offers = load_offers(fixture("data_offers_bad_status.csv")).unwrap();
    let joined = inner_join_on_order(&orders, &offers);
    assert_eq!(joined.len(), 2);

    let enriched = enrich(&joined, IntegrityMode::SkipAndCount).unwrap();
    assert_eq!(enriched.records.len(), 1);
    assert_eq!(enriched.skipped, 1);
    assert_eq!(enriched.records[0].order_gk, 2001);
}

#[test]
fn unmapped_status_code_aborts_in_strict_mode() {
    let orders = load_orders(fixture("data_orders_bad_status.csv")).unwrap();
    let offers = load_offers(fixture("data_offers_bad_status.csv")).unwrap();
    let joined = inner_join_on_order(&orders, &offers);

    let err = enrich(&joined, IntegrityMode::Strict).unwrap_err();
    match err {
        PipelineError::DataIntegrity { row, message, .. } => {
            assert_eq!(row, 2);
            assert!(message.contains("order_status_key"), "{message}");
        }
        other => panic!("expected DataIntegrity, got {other}"),
    }
}

#[test]
fn malformed_timestamps_are_integrity_violations() {
    let rows = vec![
        joined(raw_order("1", Some("no-separator"), "4", "1", None, None, 1), "10"),
        joined(raw_order("2", None, "4", "1", None, None, 2), "11"),
        joined(raw_order("3", Some("25:00:00"), "4", "1", None, None, 3), "12"),
        joined(raw_order("4", Some("09:30:00"), "4", "1", None, None, 4), "13"),
    ];
    let enriched = enrich(&rows, IntegrityMode::SkipAndCount).unwrap();
    assert_eq!(enriched.records.len(), 1);
    assert_eq!(enriched.skipped, 3);
    assert_eq!(enriched.records[0].order_hour, "09");
}

#[test]
fn nan_and_empty_values_are_absent_not_errors() {
    let rows = vec![joined(
        raw_order("1", Some("12:00:00"), "4", "0", Some("NaN"), None, 1),
        "10",
    )];
    let enriched = enrich(&rows, IntegrityMode::Strict).unwrap();
    assert_eq!(enriched.records[0].m_order_eta, None);
    assert_eq!(enriched.records[0].cancellation_time_in_seconds, None);
}

#[test]
fn negative_latency_is_an_integrity_violation() {
    let rows = vec![joined(
        raw_order("1", Some("12:00:00"), "4", "1", None, Some("-3"), 1),
        "10",
    )];
    let err = enrich(&rows, IntegrityMode::Strict).unwrap_err();
    assert!(matches!(err, PipelineError::DataIntegrity { .. }));
}

#[test]
fn failure_breakdown_counts_sum_to_total_rows() {
    let df = enriched_fixture_frame();
    let rows = failure_breakdown(&df).unwrap();

    let total: u32 = rows.iter().map(|row| row.orders).sum();
    assert_eq!(total as usize, df.height());

    let counts: Vec<(DriverAssignment, OrderStatus, u32)> = rows
        .iter()
        .map(|row| (row.is_driver_assigned, row.order_status, row.orders))
        .collect();
    assert_eq!(
        counts,
        vec![
            (DriverAssignment::No, OrderStatus::ClientCancelled, 2),
            (DriverAssignment::No, OrderStatus::SystemReject, 2),
            (DriverAssignment::Yes, OrderStatus::ClientCancelled, 2),
        ]
    );
}

#[test]
fn hourly_breakdown_sums_match_per_hour_row_counts() {
    let df = enriched_fixture_frame();
    let rows = hourly_failure_breakdown(&df).unwrap();

    let hour_col = df.column("order_hour").unwrap().str().unwrap();
    for hour in ["03", "08", "23"] {
        let from_breakdown: u32 = rows
            .iter()
            .filter(|row| row.order_hour == hour)
            .map(|row| row.orders)
            .sum();
        let from_frame = (0..df.height())
            .filter(|&idx| hour_col.get(idx) == Some(hour))
            .count();
        assert_eq!(from_breakdown as usize, from_frame, "hour {hour}");
    }

    let triple = rows
        .iter()
        .find(|row| row.order_hour == "08" && row.order_status == OrderStatus::ClientCancelled)
        .unwrap();
    assert_eq!(triple.is_driver_assigned, DriverAssignment::No);
    assert_eq!(triple.orders, 2);
}

#[test]
fn latency_groups_with_no_values_report_missing_mean() {
    let df = enriched_fixture_frame();
    let rows = hourly_cancellation_latency(&df, &OutlierPolicy::None).unwrap();

    let no_driver_at_three = rows
        .iter()
        .find(|row| row.order_hour == "03" && row.is_driver_assigned == DriverAssignment::No)
        .expect("group must exist even with no latency values");
    assert_eq!(no_driver_at_three.mean_seconds, None);
    assert_eq!(no_driver_at_three.samples, 0);

    let eight_no = rows
        .iter()
        .find(|row| row.order_hour == "08" && row.is_driver_assigned == DriverAssignment::No)
        .unwrap();
    assert_eq!(eight_no.mean_seconds, Some(45.0));
    assert_eq!(eight_no.samples, 2);
}

#[test]
fn absolute_threshold_excludes_outliers_but_keeps_the_group() {
    let df = enriched_fixture_frame();

    let unfiltered = hourly_cancellation_latency(&df, &OutlierPolicy::None).unwrap();
    let late_night = unfiltered
        .iter()
        .find(|row| row.order_hour == "23")
        .unwrap();
    assert_eq!(late_night.mean_seconds, Some(4000.0));

    let filtered =
        hourly_cancellation_latency(&df, &OutlierPolicy::MaxSeconds(1000.0)).unwrap();
    let late_night = filtered.iter().find(|row| row.order_hour == "23").unwrap();
    assert_eq!(late_night.mean_seconds, None);
    assert_eq!(late_night.samples, 0);

    // Values under the threshold are untouched.
    let eight_no = filtered
        .iter()
        .find(|row| row.order_hour == "08" && row.is_driver_assigned == DriverAssignment::No)
        .unwrap();
    assert_eq!(eight_no.mean_seconds, Some(45.0));
}

#[test]
fn stddev_policy_excludes_values_far_from_the_global_mean() {
    let df = enriched_fixture_frame();
    // Latencies present: 120, 45, 45, 4000. One sample standard deviation
    // around the global mean keeps everything but the 4000.
    let rows =
        hourly_cancellation_latency(&df, &OutlierPolicy::StdDevsFromMean(1.0)).unwrap();

    let late_night = rows.iter().find(|row| row.order_hour == "23").unwrap();
    assert_eq!(late_night.mean_seconds, None);

    let three_yes = rows
        .iter()
        .find(|row| row.order_hour == "03" && row.is_driver_assigned == DriverAssignment::Yes)
        .unwrap();
    assert_eq!(three_yes.mean_seconds, Some(120.0));
}

#[test]
fn non_positive_outlier_parameters_are_invalid_config() {
    let df = enriched_fixture_frame();
    for policy in [
        OutlierPolicy::MaxSeconds(-5.0),
        OutlierPolicy::MaxSeconds(f64::NAN),
        OutlierPolicy::StdDevsFromMean(0.0),
    ] {
        let err = hourly_cancellation_latency(&df, &policy).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)), "{policy:?}");
    }
}

#[test]
fn eta_means_ignore_absent_values() {
    let df = enriched_fixture_frame();
    let rows = hourly_mean_eta(&df).unwrap();

    let three = rows.iter().find(|row| row.order_hour == "03").unwrap();
    assert_eq!(three.mean_eta, Some(60.0));
    assert_eq!(three.samples, 1);

    let eight = rows.iter().find(|row| row.order_hour == "08").unwrap();
    assert_eq!(eight.mean_eta, Some(280.0));
    assert_eq!(eight.samples, 3);

    // Every ETA at 23:00 is absent: the mean is missing, not zero.
    let late_night = rows.iter().find(|row| row.order_hour == "23").unwrap();
    assert_eq!(late_night.mean_eta, None);
    assert_eq!(late_night.samples, 0);
}

#[test]
fn dense_expansion_zero_fills_missing_combinations() {
    let df = enriched_fixture_frame();

    let breakdown = dense_failure_breakdown(&failure_breakdown(&df).unwrap());
    assert_eq!(breakdown.len(), 4);
    let yes_reject = breakdown
        .iter()
        .find(|row| {
            row.is_driver_assigned == DriverAssignment::Yes
                && row.order_status == OrderStatus::SystemReject
        })
        .unwrap();
    assert_eq!(yes_reject.orders, 0);

    let hourly = dense_hourly_failure_breakdown(&hourly_failure_breakdown(&df).unwrap());
    assert_eq!(hourly.len(), 24 * 4);
    let sparse_total: u32 = hourly_failure_breakdown(&df)
        .unwrap()
        .iter()
        .map(|row| row.orders)
        .sum();
    let dense_total: u32 = hourly.iter().map(|row| row.orders).sum();
    assert_eq!(sparse_total, dense_total);

    let latency = dense_hourly_cancellation_latency(
        &hourly_cancellation_latency(&df, &OutlierPolicy::None).unwrap(),
    );
    assert_eq!(latency.len(), 24 * 2);
    assert!(latency
        .iter()
        .filter(|row| row.order_hour == "12")
        .all(|row| row.mean_seconds.is_none() && row.samples == 0));

    let eta = dense_hourly_mean_eta(&hourly_mean_eta(&df).unwrap());
    assert_eq!(eta.len(), 24);
    assert_eq!(eta.iter().filter(|row| row.mean_eta.is_some()).count(), 2);
}

#[test]
fn rerunning_the_pipeline_yields_identical_reports() {
    let config = ReportConfig {
        outliers: OutlierPolicy::MaxSeconds(1000.0),
        dense: true,
        ..Default::default()
    };
    let first = run_report(
        fixture("data_orders.csv"),
        fixture("data_offers.csv"),
        &config,
    )
    .unwrap();
    let second = run_report(
        fixture("data_orders.csv"),
        fixture("data_offers.csv"),
        &config,
    )
    .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.enriched_rows, 6);
    assert_eq!(first.skipped_rows, 0);
}

#[test]
fn two_order_scenario_matches_expected_tables() {
    let report = run_report(
        fixture("scenario_orders.csv"),
        fixture("scenario_offers.csv"),
        &ReportConfig::default(),
    )
    .unwrap();

    assert_eq!(report.enriched_rows, 2);
    assert_eq!(report.failure_breakdown.len(), 2);

    let yes_cancelled = report
        .failure_breakdown
        .iter()
        .find(|row| row.is_driver_assigned == DriverAssignment::Yes)
        .unwrap();
    assert_eq!(yes_cancelled.order_status, OrderStatus::ClientCancelled);
    assert_eq!(yes_cancelled.orders, 1);

    let no_rejected = report
        .failure_breakdown
        .iter()
        .find(|row| row.is_driver_assigned == DriverAssignment::No)
        .unwrap();
    assert_eq!(no_rejected.order_status, OrderStatus::SystemReject);
    assert_eq!(no_rejected.orders, 1);

    let three = report
        .hourly_mean_eta
        .iter()
        .find(|row| row.order_hour == "03")
        .unwrap();
    assert_eq!(three.mean_eta, Some(7.5));
    assert_eq!(three.samples, 2);
}

#[test]
fn missing_source_is_data_unavailable() {
    let err = load_orders(fixture("does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable { .. }));

    let err = run_report(
        fixture("does_not_exist.csv"),
        fixture("data_offers.csv"),
        &ReportConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable { .. }));
}

#[test]
fn ragged_table_is_data_unavailable() {
    let err = load_orders(fixture("data_orders_ragged.csv")).unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable { .. }));
}

#[test]
fn missing_required_column_is_data_unavailable() {
    // The orders fixture has no offer_id column.
    let err = load_offers(fixture("data_orders.csv")).unwrap_err();
    match err {
        PipelineError::DataUnavailable { name, source } => {
            assert_eq!(name, "data_offers");
            assert!(source.to_string().contains("offer_id"));
        }
        other => panic!("expected DataUnavailable, got {other}"),
    }
}

#[test]
fn config_round_trips_through_toml() {
    let toml_text = r#"
        integrity = "strict"
        dense = true

        [outliers]
        method = "max-seconds"
        value = 3600.0
    "#;
    let config: ReportConfig = toml::from_str(toml_text).unwrap();
    assert_eq!(config.integrity, IntegrityMode::Strict);
    assert!(config.dense);
    assert_eq!(config.outliers, OutlierPolicy::MaxSeconds(3600.0));

    let default: ReportConfig = toml::from_str("").unwrap();
    assert_eq!(default, ReportConfig::default());
}

#[test]
fn empty_inputs_produce_empty_sparse_tables() {
    let df = enriched_to_dataframe(&[]).unwrap();
    assert!(failure_breakdown(&df).unwrap().is_empty());
    assert!(hourly_failure_breakdown(&df).unwrap().is_empty());
    assert!(hourly_cancellation_latency(&df, &OutlierPolicy::None)
        .unwrap()
        .is_empty());
    assert!(hourly_mean_eta(&df).unwrap().is_empty());
}
