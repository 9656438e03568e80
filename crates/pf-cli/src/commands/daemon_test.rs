use super::*;
use chrono::TimeZone;
use pf_pipeline::SAMPLE_PAYLOAD;

fn deterministic() -> RunConfig {
    RunConfig {
        deterministic: true,
    }
}

#[tokio::test]
async fn test_tick_materializes_previous_day() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_lookup(dir.path(), |_| None);
    std::fs::create_dir_all(&settings.data_dir).unwrap();
    std::fs::write(&settings.sample_api_payload, SAMPLE_PAYLOAD).unwrap();
    let defs = Definitions::standard().unwrap();

    let tick = Utc.with_ymd_and_hms(2024, 5, 2, 2, 0, 0).unwrap();
    let result = run_tick(&settings, &defs, tick, deterministic())
        .await
        .unwrap();
    assert!(result.succeeded());
    assert_eq!(result.partition_key.to_string(), "2024-05-01");
}

#[tokio::test]
async fn test_failed_tick_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_lookup(dir.path(), |_| None);
    let defs = Definitions::standard().unwrap();

    let tick = Utc.with_ymd_and_hms(2024, 5, 2, 2, 0, 0).unwrap();
    let result = run_tick(&settings, &defs, tick, deterministic())
        .await
        .unwrap();
    assert!(!result.succeeded());

    // before the first partition: rejected up front
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
    assert!(run_tick(&settings, &defs, early, deterministic())
        .await
        .is_none());
}
