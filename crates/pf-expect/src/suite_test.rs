use super::*;
use serde_json::json;

fn config(expectation_type: &str, kwargs: Value) -> ExpectationConfig {
    ExpectationConfig {
        expectation_type: expectation_type.to_string(),
        kwargs: kwargs.as_object().cloned().unwrap_or_default(),
        meta: Map::new(),
    }
}

#[test]
fn test_parse_suite_document() {
    let suite = ExpectationSuite::from_json(
        r#"{
            "expectation_suite_name": "agg_suite",
            "expectations": [
                {"expectation_type": "expect_table_row_count_to_be_between",
                 "kwargs": {"min_value": 1}},
                {"expectation_type": "expect_column_values_to_be_between",
                 "kwargs": {"column": "avg_price_usd", "min_value": 0, "mostly": 0.95},
                 "meta": {"notes": "prices are positive"}}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(suite.expectation_suite_name, "agg_suite");
    let compiled = suite.compile().unwrap();
    assert_eq!(
        compiled[0],
        Expectation::TableRowCountToBeBetween {
            min_value: Some(1.0),
            max_value: None
        }
    );
    assert_eq!(
        compiled[1],
        Expectation::ColumnValuesToBeBetween {
            column: "avg_price_usd".to_string(),
            min_value: Some(0.0),
            max_value: None,
            strict_min: false,
            strict_max: false,
            mostly: 0.95,
        }
    );
}

#[test]
fn test_unknown_expectation_names_suite() {
    let err = ExpectationSuite::from_json(
        r#"{"expectation_suite_name": "s",
            "expectations": [{"expectation_type": "expect_the_moon", "kwargs": {}}]}"#,
    )
    .unwrap_err();
    match err {
        ExpectError::UnknownExpectation {
            suite,
            expectation_type,
        } => {
            assert_eq!(suite, "s");
            assert_eq!(expectation_type, "expect_the_moon");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mostly_defaults_and_bounds() {
    let e = Expectation::from_config(&config(
        "expect_column_values_to_not_be_null",
        json!({"column": "price_usd"}),
    ))
    .unwrap();
    assert_eq!(
        e,
        Expectation::ColumnValuesToNotBeNull {
            column: "price_usd".to_string(),
            mostly: 1.0
        }
    );

    let err = Expectation::from_config(&config(
        "expect_column_values_to_not_be_null",
        json!({"column": "price_usd", "mostly": 1.5}),
    ))
    .unwrap_err();
    assert!(matches!(err, ExpectError::InvalidKwargs { .. }));
}

#[test]
fn test_missing_column_kwarg() {
    let err = Expectation::from_config(&config("expect_column_to_exist", json!({}))).unwrap_err();
    assert!(err.to_string().contains("missing 'column'"));
}

#[test]
fn test_between_rejects_inverted_bounds() {
    let err = Expectation::from_config(&config(
        "expect_column_values_to_be_between",
        json!({"column": "x", "min_value": 5, "max_value": 1}),
    ))
    .unwrap_err();
    assert!(matches!(err, ExpectError::InvalidKwargs { .. }));
}

#[test]
fn test_in_set_and_regex_validation() {
    assert!(Expectation::from_config(&config(
        "expect_column_values_to_be_in_set",
        json!({"column": "x", "value_set": "abc"}),
    ))
    .is_err());
    assert!(Expectation::from_config(&config(
        "expect_column_values_to_be_in_set",
        json!({"column": "x", "value_set": [[1]]}),
    ))
    .is_err());
    assert!(Expectation::from_config(&config(
        "expect_column_values_to_match_regex",
        json!({"column": "x", "regex": "("}),
    ))
    .is_err());
    assert!(Expectation::from_config(&config(
        "expect_column_values_to_match_regex",
        json!({"column": "partition_date", "regex": "^\\d{4}-\\d{2}-\\d{2}$"}),
    ))
    .is_ok());
}

#[test]
fn test_pair_columns() {
    let e = Expectation::from_config(&config(
        "expect_column_pair_values_a_to_be_greater_than_b",
        json!({"column_A": "max_price_usd", "column_B": "min_price_usd", "or_equal": true}),
    ))
    .unwrap();
    assert_eq!(e.columns(), vec!["max_price_usd", "min_price_usd"]);
}

#[test]
fn test_load_reports_path_on_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ExpectationSuite::load(&path).unwrap_err();
    assert!(matches!(err, ExpectError::SuiteParse { .. }));
    assert!(err.to_string().contains("broken.json"));
}
