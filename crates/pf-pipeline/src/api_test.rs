use super::*;
use std::path::Path;

fn settings_in(dir: &Path) -> Settings {
    Settings::from_lookup(dir, |key| match key {
        "MARKET_DATA_URL" => Some("http://127.0.0.1:9/market_chart".to_string()),
        _ => None,
    })
}

fn key(s: &str) -> PartitionKey {
    PartitionKey::parse(s).unwrap()
}

#[test]
fn test_sample_payload_parses() {
    let snapshot = MarketSnapshot::from_json(SAMPLE_PAYLOAD).unwrap();
    assert!(!snapshot.prices.is_empty());
    assert_eq!(snapshot.prices.len(), snapshot.market_caps.len());
    assert_eq!(snapshot.prices.len(), snapshot.total_volumes.len());
}

#[tokio::test]
async fn test_deterministic_fetch_stamps_partition_midnight() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    std::fs::create_dir_all(&settings.data_dir).unwrap();
    std::fs::write(&settings.sample_api_payload, SAMPLE_PAYLOAD).unwrap();

    let client = MarketDataClient::new(&settings).unwrap();
    let first = client.fetch(key("2024-05-01"), true).await.unwrap();
    let second = client.fetch(key("2024-05-01"), true).await.unwrap();

    assert_eq!(first.fetched_at, "2024-05-01T00:00:00+00:00");
    assert_eq!(first, second);

    let other = client.fetch(key("2024-06-15"), true).await.unwrap();
    assert_eq!(other.fetched_at, "2024-06-15T00:00:00+00:00");
    assert_eq!(other.prices, first.prices);
}

#[tokio::test]
async fn test_deterministic_fetch_without_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let client = MarketDataClient::new(&settings_in(dir.path())).unwrap();
    let err = client.fetch(key("2024-05-01"), true).await.unwrap_err();
    assert!(matches!(err, PipelineError::Fixture { .. }));
}

#[tokio::test]
async fn test_live_fetch_connection_error_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let client = MarketDataClient::new(&settings_in(dir.path())).unwrap();
    let err = client.fetch(key("2024-05-01"), false).await.unwrap_err();
    assert!(matches!(err, PipelineError::Http(_)), "{err}");
}

#[test]
fn test_first_row_uses_first_point_of_each_series() {
    let mut snapshot = MarketSnapshot::from_json(SAMPLE_PAYLOAD).unwrap();
    snapshot.fetched_at = "2024-05-01T00:00:00+00:00".to_string();
    let row = snapshot.first_row(key("2024-05-01")).unwrap();

    assert_eq!(row.partition_date, "2024-05-01");
    assert_eq!(row.timestamp_ms, snapshot.prices[0].timestamp_ms());
    assert_eq!(row.price_usd, snapshot.prices[0].1);
    assert_eq!(row.market_cap_usd, snapshot.market_caps[0].1);
    assert_eq!(row.volume_usd, snapshot.total_volumes[0].1);
    assert_eq!(row.fetched_at, "2024-05-01T00:00:00+00:00");
}

#[test]
fn test_null_values_become_missing() {
    let snapshot = MarketSnapshot::from_json(
        r#"{"prices": [[1714521600000, null]], "market_caps": [[1714521600000, 5.0]],
            "total_volumes": [[1714521600000, null]]}"#,
    )
    .unwrap();
    let row = snapshot.first_row(key("2024-05-01")).unwrap();
    assert_eq!(row.price_usd, None);
    assert_eq!(row.market_cap_usd, Some(5.0));
    assert_eq!(row.volume_usd, None);
    assert_eq!(row.fetched_at, "");
}

#[test]
fn test_empty_series_is_an_error() {
    let snapshot = MarketSnapshot::from_json(
        r#"{"prices": [], "market_caps": [[1, 2.0]], "total_volumes": [[1, 3.0]]}"#,
    )
    .unwrap();
    let err = snapshot.first_row(key("2024-05-01")).unwrap_err();
    assert!(err.to_string().contains("prices"));
}

#[test]
fn test_malformed_payload() {
    assert!(matches!(
        MarketSnapshot::from_json(r#"{"prices": "nope"}"#).unwrap_err(),
        PipelineError::Payload(_)
    ));
}
