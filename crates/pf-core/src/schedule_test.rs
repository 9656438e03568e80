use super::*;
use chrono::TimeZone;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[test]
fn test_daily_cron_next_tick_same_day() {
    let cron = CronSchedule::parse(DAILY_CRON).unwrap();
    assert_eq!(cron.next_after(at(2024, 5, 1, 0, 30)), Some(at(2024, 5, 1, 2, 0)));
}

#[test]
fn test_daily_cron_next_tick_is_strictly_after() {
    let cron = CronSchedule::parse(DAILY_CRON).unwrap();
    assert_eq!(cron.next_after(at(2024, 5, 1, 2, 0)), Some(at(2024, 5, 2, 2, 0)));
    assert_eq!(cron.next_after(at(2024, 12, 31, 23, 59)), Some(at(2025, 1, 1, 2, 0)));
}

#[test]
fn test_steps_lists_and_ranges() {
    let cron = CronSchedule::parse("*/15 9-10 * * *").unwrap();
    assert_eq!(cron.next_after(at(2024, 5, 1, 9, 0)), Some(at(2024, 5, 1, 9, 15)));
    assert_eq!(cron.next_after(at(2024, 5, 1, 10, 45)), Some(at(2024, 5, 2, 9, 0)));

    let cron = CronSchedule::parse("5,35 * * * *").unwrap();
    assert_eq!(cron.next_after(at(2024, 5, 1, 9, 6)), Some(at(2024, 5, 1, 9, 35)));
}

#[test]
fn test_day_of_week() {
    // 2024-05-01 is a Wednesday; next Monday is 2024-05-06
    let cron = CronSchedule::parse("0 0 * * 1").unwrap();
    assert_eq!(cron.next_after(at(2024, 5, 1, 0, 0)), Some(at(2024, 5, 6, 0, 0)));

    let sunday = CronSchedule::parse("0 0 * * 7").unwrap();
    assert_eq!(sunday.next_after(at(2024, 5, 1, 0, 0)), Some(at(2024, 5, 5, 0, 0)));
}

#[test]
fn test_restricted_day_fields_match_either() {
    // the 10th, or any Monday
    let cron = CronSchedule::parse("0 0 10 * 1").unwrap();
    assert_eq!(cron.next_after(at(2024, 5, 1, 0, 0)), Some(at(2024, 5, 6, 0, 0)));
    assert_eq!(cron.next_after(at(2024, 5, 6, 0, 0)), Some(at(2024, 5, 10, 0, 0)));
}

#[test]
fn test_leap_day_schedule() {
    let cron = CronSchedule::parse("0 0 29 2 *").unwrap();
    assert_eq!(cron.next_after(at(2024, 3, 1, 0, 0)), Some(at(2028, 2, 29, 0, 0)));
}

#[test]
fn test_invalid_expressions() {
    for expr in [
        "",
        "0 2 * *",
        "60 * * * *",
        "0 24 * * *",
        "*/0 * * * *",
        "a * * * *",
        "5-1 * * * *",
    ] {
        let err = CronSchedule::parse(expr).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCron { .. }), "{expr}");
    }
}

#[test]
fn test_schedule_definition() {
    let def = ScheduleDefinition::new("daily_schedule", "daily_job", DAILY_CRON).unwrap();
    assert_eq!(def.cron, "0 2 * * *");
    assert!(def.schedule().matches(at(2024, 5, 2, 2, 0)));
    assert_eq!(def.next_tick(at(2024, 5, 2, 3, 0)), Some(at(2024, 5, 3, 2, 0)));

    let json = serde_json::to_value(&def).unwrap();
    assert_eq!(json["job"], "daily_job");
}

#[test]
fn test_partition_for_tick_is_previous_day() {
    let key = ScheduleDefinition::partition_for_tick(at(2024, 5, 2, 2, 0));
    assert_eq!(key.to_string(), "2024-05-01");
    let key = ScheduleDefinition::partition_for_tick(at(2024, 3, 1, 2, 0));
    assert_eq!(key.to_string(), "2024-02-29");
}
