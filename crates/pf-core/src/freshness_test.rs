use super::*;
use chrono::TimeZone;

fn key(s: &str) -> PartitionKey {
    PartitionKey::parse(s).unwrap()
}

#[test]
fn test_default_policy_is_one_day() {
    let policy = FreshnessPolicy::default();
    assert_eq!(policy.maximum_lag_minutes, 1440);
    assert_eq!(policy.maximum_lag(), Duration::days(1));
}

#[test]
fn test_missing_without_partitions() {
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
    let status = FreshnessPolicy::default().evaluate(None, now);
    assert_eq!(status, FreshnessStatus::Missing);
    assert_eq!(status.to_string(), "missing");
}

#[test]
fn test_yesterday_is_fresh() {
    // 2024-05-01 ends at 2024-05-02T00:00Z, 12 hours before now
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
    let status = FreshnessPolicy::default().evaluate(Some(key("2024-05-01")), now);
    assert!(status.is_fresh());
    assert_eq!(
        status,
        FreshnessStatus::Fresh {
            latest: key("2024-05-01"),
            lag_minutes: 720
        }
    );
    assert_eq!(status.to_string(), "fresh (latest 2024-05-01, lag 720m)");
}

#[test]
fn test_exact_lag_is_still_fresh() {
    let now = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
    let status = FreshnessPolicy::default().evaluate(Some(key("2024-05-01")), now);
    assert!(status.is_fresh());
}

#[test]
fn test_older_partition_is_stale() {
    let now = Utc.with_ymd_and_hms(2024, 5, 3, 0, 1, 0).unwrap();
    let status = FreshnessPolicy::default().evaluate(Some(key("2024-05-01")), now);
    assert_eq!(status.label(), "stale");
    assert!(!status.is_fresh());
}

#[test]
fn test_status_serializes_with_tag() {
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    let status = FreshnessPolicy::new(60).evaluate(Some(key("2024-05-01")), now);
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["status"], "fresh");
    assert_eq!(json["latest"], "2024-05-01");
    assert_eq!(json["lag_minutes"], 0);
}
