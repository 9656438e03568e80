use super::*;
use crate::checkpoint::{Batch, CheckpointStatistics, RunIdentifier};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

fn setup() -> (TempDir, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_lookup(dir.path(), |_| None);
    (dir, settings)
}

fn write_suite(settings: &Settings, name: &str) {
    std::fs::create_dir_all(settings.suites_dir()).unwrap();
    std::fs::write(
        settings.suites_dir().join(format!("{name}.json")),
        format!(
            r#"{{"expectation_suite_name": "{name}", "expectations": [
                {{
                    "expectation_type": "expect_column_to_exist",
                    "kwargs": {{"column": "partition_date"}}
                }}
            ]}}"#
        ),
    )
    .unwrap();
}

fn result_at(suite: &str, hour: u32) -> CheckpointResult {
    let run_time = Utc.with_ymd_and_hms(2024, 5, 2, hour, 0, 0).unwrap();
    CheckpointResult {
        checkpoint_name: format!("{suite}_checkpoint"),
        suite_name: suite.to_string(),
        run_id: RunIdentifier::at(run_time),
        batch: Batch {
            table: "daily_agg".to_string(),
            partition_date: "2024-05-01".to_string(),
        },
        success: true,
        statistics: CheckpointStatistics {
            evaluated_expectations: 0,
            successful_expectations: 0,
            unsuccessful_expectations: 0,
            success_percent: 100.0,
        },
        results: Vec::new(),
    }
}

#[test]
fn test_ensure_suites_skips_missing_files() {
    let (_dir, settings) = setup();
    write_suite(&settings, "cleaned_suite");

    let mut store = ExpectationStore::new(&settings);
    let registered = store.ensure_suites(&["cleaned_suite", "agg_suite"]).unwrap();

    assert_eq!(registered, 1);
    assert!(store.suite("cleaned_suite").is_ok());
    assert!(matches!(
        store.suite("agg_suite"),
        Err(ExpectError::SuiteNotRegistered { .. })
    ));
    assert_eq!(store.suite_names().collect::<Vec<_>>(), vec!["cleaned_suite"]);
}

#[test]
fn test_ensure_suites_without_directory() {
    let (_dir, settings) = setup();
    let mut store = ExpectationStore::new(&settings);
    assert_eq!(store.ensure_suites(&["cleaned_suite"]).unwrap(), 0);
}

#[test]
fn test_ensure_suites_rejects_broken_file() {
    let (_dir, settings) = setup();
    std::fs::create_dir_all(settings.suites_dir()).unwrap();
    std::fs::write(settings.suites_dir().join("agg_suite.json"), "[]").unwrap();

    let mut store = ExpectationStore::new(&settings);
    let err = store.ensure_suites(&["agg_suite"]).unwrap_err();
    assert!(matches!(err, ExpectError::SuiteParse { .. }));
}

#[test]
fn test_latest_validation_path() {
    let (_dir, settings) = setup();
    let store = ExpectationStore::new(&settings);
    assert_eq!(store.latest_validation_path().unwrap(), None);

    store.save_result(&result_at("agg_suite", 3)).unwrap();
    let newest = store.save_result(&result_at("cleaned_suite", 5)).unwrap();
    store.save_result(&result_at("agg_suite", 4)).unwrap();

    assert_eq!(store.latest_validation_path().unwrap(), Some(newest));
}

#[test]
fn test_save_result_leaves_no_temp_files() {
    let (_dir, settings) = setup();
    let store = ExpectationStore::new(&settings);
    let path = store.save_result(&result_at("agg_suite", 2)).unwrap();

    let names: Vec<String> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["20240502T020000.000000Z.json"]);
}
