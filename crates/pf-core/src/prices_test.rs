use super::*;
use crate::error::CoreError;

fn raw(date: &str, ts: i64, price: Option<f64>, volume: Option<f64>) -> RawPrice {
    RawPrice {
        partition_date: date.to_string(),
        timestamp_ms: ts,
        price_usd: price,
        market_cap_usd: Some(1.2e12),
        volume_usd: volume,
        fetched_at: "2024-05-01T00:00:00+00:00".to_string(),
    }
}

#[test]
fn test_clean_derives_timestamp() {
    let cleaned = clean(&[raw("2024-05-01", 1_714_521_600_000, Some(60_000.0), Some(1.0))]);
    assert_eq!(cleaned.len(), 1);
    let ts = cleaned[0].timestamp.unwrap();
    assert_eq!(ts.to_rfc3339(), "2024-05-01T00:00:00+00:00");
    assert_eq!(cleaned[0].price_usd, Some(60_000.0));
    assert_eq!(cleaned[0].partition_date, "2024-05-01");
}

#[test]
fn test_clean_out_of_range_timestamp_is_missing() {
    let cleaned = clean(&[raw("2024-05-01", i64::MAX, Some(1.0), Some(1.0))]);
    assert!(cleaned[0].timestamp.is_none());
}

#[test]
fn test_aggregate_single_point_is_degenerate() {
    let cleaned = clean(&[raw("2024-05-01", 1_714_521_600_000, Some(60_000.0), Some(2.5e10))]);
    let agg = aggregate(&cleaned);
    assert_eq!(agg.len(), 1);
    assert_eq!(agg[0].avg_price_usd, Some(60_000.0));
    assert_eq!(agg[0].avg_price_usd, agg[0].max_price_usd);
    assert_eq!(agg[0].max_price_usd, agg[0].min_price_usd);
    assert_eq!(agg[0].total_volume_usd, 2.5e10);
}

#[test]
fn test_aggregate_groups_multiple_partitions() {
    let cleaned = clean(&[
        raw("2024-05-02", 2, Some(30.0), Some(5.0)),
        raw("2024-05-01", 1, Some(10.0), Some(1.0)),
        raw("2024-05-01", 1, Some(20.0), Some(2.0)),
        raw("2024-05-02", 2, None, None),
    ]);
    let agg = aggregate(&cleaned);

    assert_eq!(agg.len(), 2);
    assert_eq!(agg[0].partition_date, "2024-05-01");
    assert_eq!(agg[0].avg_price_usd, Some(15.0));
    assert_eq!(agg[0].max_price_usd, Some(20.0));
    assert_eq!(agg[0].min_price_usd, Some(10.0));
    assert_eq!(agg[0].total_volume_usd, 3.0);

    assert_eq!(agg[1].partition_date, "2024-05-02");
    assert_eq!(agg[1].avg_price_usd, Some(30.0));
    assert_eq!(agg[1].total_volume_usd, 5.0);
}

#[test]
fn test_aggregate_group_without_prices() {
    let cleaned = clean(&[raw("2024-05-01", 1, None, None)]);
    let agg = aggregate(&cleaned);
    assert_eq!(agg[0].avg_price_usd, None);
    assert_eq!(agg[0].max_price_usd, None);
    assert_eq!(agg[0].total_volume_usd, 0.0);
}

#[test]
fn test_aggregate_empty_input() {
    assert!(aggregate(&[]).is_empty());
}

#[test]
fn test_values_round_trip_through_record() {
    let row = clean(&[raw("2024-05-01", 1_714_521_600_000, None, Some(3.0))]).remove(0);
    let back = CleanedPrice::from_values(row.to_values()).unwrap();
    assert_eq!(back, row);
}

#[test]
fn test_from_values_rejects_wrong_arity() {
    let err = DailyAgg::from_values(vec![SqlValue::Varchar("2024-05-01".into())]).unwrap_err();
    assert!(matches!(err, CoreError::RecordDecode { .. }));
    assert!(err.to_string().contains("daily_agg"));
}

#[test]
fn test_from_values_rejects_wrong_type() {
    let mut values = raw("2024-05-01", 1, Some(1.0), Some(1.0)).to_values();
    values[1] = SqlValue::Varchar("not a number".into());
    let err = RawPrice::from_values(values).unwrap_err();
    assert!(err.to_string().contains("timestamp_ms"));
}

#[test]
fn test_columns_start_with_partition_date() {
    assert_eq!(RawPrice::COLUMNS[0].name, "partition_date");
    assert_eq!(CleanedPrice::COLUMNS[0].name, "partition_date");
    assert_eq!(DailyAgg::COLUMNS[0].name, "partition_date");
}
