//! Materialize a partition, validate it with the shipped suites, render the report

use pf_core::definitions::Definitions;
use pf_core::partition::PartitionKey;
use pf_core::settings::Settings;
use pf_expect::{
    run_validation, write_report, ExpectationStore, DEFAULT_SUITES, NO_VALIDATION_MESSAGE,
};
use pf_pipeline::{run_job, RunConfig, SAMPLE_PAYLOAD};
use std::path::Path;

fn scaffold(dir: &Path) -> Settings {
    let settings = Settings::from_lookup(dir, |_| None);
    std::fs::create_dir_all(&settings.data_dir).unwrap();
    std::fs::write(&settings.sample_api_payload, SAMPLE_PAYLOAD).unwrap();
    std::fs::create_dir_all(settings.suites_dir()).unwrap();
    for (name, json) in DEFAULT_SUITES {
        std::fs::write(settings.suites_dir().join(format!("{name}.json")), json).unwrap();
    }
    settings
}

#[tokio::test]
async fn test_report_placeholder_before_validation() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_lookup(dir.path(), |_| None);

    let path = write_report(&settings).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains(NO_VALIDATION_MESSAGE));
}

#[tokio::test]
async fn test_materialize_validate_report() {
    let dir = tempfile::tempdir().unwrap();
    let settings = scaffold(dir.path());
    let defs = Definitions::standard().unwrap();

    for key in ["2024-04-30", "2024-05-01"] {
        let result = run_job(
            &settings,
            &defs,
            PartitionKey::parse(key).unwrap(),
            RunConfig {
                deterministic: true,
            },
            None,
        )
        .await
        .unwrap();
        assert!(result.succeeded());
    }

    let report = run_validation(&settings).await.unwrap();
    assert_eq!(report.cleaned_partition.as_deref(), Some("2024-05-01"));
    assert_eq!(report.agg_partition.as_deref(), Some("2024-05-01"));
    let cleaned = report.results.cleaned.as_ref().unwrap();
    let agg = report.results.agg.as_ref().unwrap();
    assert!(cleaned.success, "{:#?}", cleaned.results);
    assert!(agg.success, "{:#?}", agg.results);

    let store = ExpectationStore::new(&settings);
    assert!(store.latest_validation_path().unwrap().is_some());

    let text = std::fs::read_to_string(write_report(&settings).unwrap()).unwrap();
    assert!(text.contains("Cleaned partition: 2024-05-01"));
    assert!(text.contains("## Aggregated Asset Validation"));
    assert!(text.contains("Success: true"));
    assert!(!text.contains(NO_VALIDATION_MESSAGE));
}
