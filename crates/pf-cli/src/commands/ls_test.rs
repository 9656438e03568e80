use super::*;
use chrono::TimeZone;

#[test]
fn test_listing_orders_assets_and_schedules_job() {
    let defs = Definitions::standard().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let listing = Listing::build(&defs, now).unwrap();

    let names: Vec<&str> = listing.assets.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(names, vec!["raw_asset", "cleaned_asset", "agg_asset"]);

    let job = &listing.jobs[0];
    assert_eq!(job.name, "daily_job");
    assert_eq!(job.schedule, Some("daily_schedule"));
    assert_eq!(job.cron, Some("0 2 * * *"));
    assert_eq!(
        job.next_tick,
        Some(Utc.with_ymd_and_hms(2024, 5, 2, 2, 0, 0).unwrap())
    );
    assert_eq!(listing.partitions_start, "2024-01-01");
}

#[test]
fn test_listing_serializes() {
    let defs = Definitions::standard().unwrap();
    let listing = Listing::build(&defs, Utc::now()).unwrap();
    let json = serde_json::to_value(&listing).unwrap();
    assert_eq!(json["assets"][1]["table"], "cleaned_prices");
    assert_eq!(json["assets"][1]["upstream"][0], "raw_asset");
    assert_eq!(json["jobs"][0]["assets"][2], "agg_asset");
}
