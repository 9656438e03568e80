use super::*;

#[test]
fn test_standard_definitions() {
    let defs = Definitions::standard().unwrap();
    let keys: Vec<&str> = defs.assets.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, vec![RAW_ASSET, CLEANED_ASSET, AGG_ASSET]);

    let cleaned = defs.asset(CLEANED_ASSET).unwrap();
    assert_eq!(cleaned.table, "cleaned_prices");
    assert_eq!(cleaned.upstream, vec![RAW_ASSET]);
    assert_eq!(
        cleaned.checks,
        vec!["cleaned_row_count_positive", "cleaned_null_threshold"]
    );
    assert_eq!(cleaned.freshness.maximum_lag_minutes, 1440);
}

#[test]
fn test_standard_dag_is_linear() {
    let defs = Definitions::standard().unwrap();
    let order = defs.dag().unwrap().topological_order().unwrap();
    let names: Vec<&str> = order.iter().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["raw_asset", "cleaned_asset", "agg_asset"]);
}

#[test]
fn test_daily_job_and_schedule() {
    let defs = Definitions::standard().unwrap();
    let job = defs.job(DAILY_JOB).unwrap();
    assert_eq!(job.assets.len(), 3);

    let schedule = defs.schedule(DAILY_SCHEDULE).unwrap();
    assert_eq!(schedule.job, DAILY_JOB);
    assert_eq!(schedule.cron, "0 2 * * *");
    assert!(defs.schedule("hourly").is_none());
}

#[test]
fn test_unknown_asset_lookup() {
    let defs = Definitions::standard().unwrap();
    assert!(matches!(
        defs.asset("gold_asset").unwrap_err(),
        CoreError::AssetNotFound { .. }
    ));
}

#[test]
fn test_partitions_start_2024() {
    let defs = Definitions::standard().unwrap();
    assert_eq!(defs.partitions.start().to_string(), "2024-01-01");
}
