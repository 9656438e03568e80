use super::*;
use crate::api::SAMPLE_PAYLOAD;
use pf_db::Database;
use tempfile::TempDir;

fn setup() -> (TempDir, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_lookup(dir.path(), |_| None);
    std::fs::create_dir_all(&settings.data_dir).unwrap();
    std::fs::write(&settings.sample_api_payload, SAMPLE_PAYLOAD).unwrap();
    (dir, settings)
}

fn ctx(settings: &Settings) -> AssetContext<'_> {
    AssetContext {
        settings,
        partition_key: PartitionKey::parse("2024-05-01").unwrap(),
        run_id: "test",
    }
}

async fn count(settings: &Settings, table: &str) -> usize {
    let db = DuckDbBackend::open(&settings.duckdb_path).unwrap();
    db.query_count(&format!("SELECT * FROM {table}")).await.unwrap()
}

#[tokio::test]
async fn test_raw_asset_deterministic() {
    let (_dir, settings) = setup();
    let client = MarketDataClient::new(&settings).unwrap();
    let raw = raw_asset(&ctx(&settings), &client, true).await.unwrap();

    assert_eq!(raw.record_count(), 1);
    assert_eq!(raw.records[0].partition_date, "2024-05-01");
    assert_eq!(raw.records[0].fetched_at, "2024-05-01T00:00:00+00:00");
    assert!(raw.checks_passed());
    assert_eq!(raw.checks[0].check_name, "raw_row_count_positive");
    assert_eq!(count(&settings, "raw_prices").await, 1);
}

#[tokio::test]
async fn test_cleaned_asset_checks() {
    let (_dir, settings) = setup();
    let client = MarketDataClient::new(&settings).unwrap();
    let raw = raw_asset(&ctx(&settings), &client, true).await.unwrap();
    let cleaned = cleaned_asset(&ctx(&settings), &raw.records).await.unwrap();

    assert_eq!(cleaned.record_count(), 1);
    assert!(cleaned.records[0].timestamp.is_some());
    let names: Vec<&str> = cleaned.checks.iter().map(|c| c.check_name.as_str()).collect();
    assert_eq!(names, vec!["cleaned_row_count_positive", "cleaned_null_threshold"]);
    assert!(cleaned.checks_passed());
}

#[tokio::test]
async fn test_cleaned_asset_empty_input_fails_checks_only() {
    let (_dir, settings) = setup();
    let cleaned = cleaned_asset(&ctx(&settings), &[]).await.unwrap();
    assert_eq!(cleaned.record_count(), 0);
    assert!(cleaned.checks.iter().all(|c| !c.passed));
    assert_eq!(count(&settings, "cleaned_prices").await, 0);
}

#[tokio::test]
async fn test_agg_asset_single_point() {
    let (_dir, settings) = setup();
    let client = MarketDataClient::new(&settings).unwrap();
    let raw = raw_asset(&ctx(&settings), &client, true).await.unwrap();
    let cleaned = cleaned_asset(&ctx(&settings), &raw.records).await.unwrap();
    let agg = agg_asset(&ctx(&settings), &cleaned.records).await.unwrap();

    assert_eq!(agg.record_count(), 1);
    let row = &agg.records[0];
    assert_eq!(row.avg_price_usd, raw.records[0].price_usd);
    assert_eq!(row.max_price_usd, row.min_price_usd);
    assert_eq!(Some(row.total_volume_usd), raw.records[0].volume_usd);
    assert!(agg.checks_passed());
}

#[tokio::test]
async fn test_agg_asset_empty_input() {
    let (_dir, settings) = setup();
    let agg = agg_asset(&ctx(&settings), &[]).await.unwrap();
    assert_eq!(agg.record_count(), 0);
    assert!(!agg.checks_passed());
    assert_eq!(agg.checks[0].metadata["row_count"], 0);
}

#[tokio::test]
async fn test_rerun_replaces_partition() {
    let (_dir, settings) = setup();
    let client = MarketDataClient::new(&settings).unwrap();
    for _ in 0..2 {
        raw_asset(&ctx(&settings), &client, true).await.unwrap();
    }
    assert_eq!(count(&settings, "raw_prices").await, 1);
}
