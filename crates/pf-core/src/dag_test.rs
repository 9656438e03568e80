use super::*;

fn deps(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

/// raw_asset -> cleaned_asset -> agg_asset
fn pipeline_dag() -> AssetDag {
    AssetDag::build(&deps(&[
        ("raw_asset", &[]),
        ("cleaned_asset", &["raw_asset"]),
        ("agg_asset", &["cleaned_asset"]),
    ]))
    .unwrap()
}

fn names(keys: &[AssetKey]) -> Vec<&str> {
    keys.iter().map(|k| k.as_str()).collect()
}

#[test]
fn test_linear_order() {
    let dag = pipeline_dag();
    let order = dag.topological_order().unwrap();
    assert_eq!(names(&order), vec!["raw_asset", "cleaned_asset", "agg_asset"]);
}

#[test]
fn test_order_is_stable_for_siblings() {
    let dag = AssetDag::build(&deps(&[
        ("zeta", &[]),
        ("alpha", &[]),
        ("joined", &["zeta", "alpha"]),
    ]))
    .unwrap();
    let order = dag.topological_order().unwrap();
    assert_eq!(names(&order), vec!["alpha", "zeta", "joined"]);
}

#[test]
fn test_circular_dependency() {
    let result = AssetDag::build(&deps(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]));
    assert!(matches!(
        result.unwrap_err(),
        CoreError::CircularDependency { .. }
    ));
}

#[test]
fn test_unknown_upstream_rejected() {
    let result = AssetDag::build(&deps(&[("cleaned_asset", &["raw_asset"])]));
    assert!(matches!(
        result.unwrap_err(),
        CoreError::AssetNotFound { name } if name == "raw_asset"
    ));
}

#[test]
fn test_invalid_asset_name_rejected() {
    let mut dag = AssetDag::new();
    assert!(matches!(
        dag.add_asset("Raw Asset").unwrap_err(),
        CoreError::InvalidName { .. }
    ));
}

#[test]
fn test_neighbors_and_reachability() {
    let dag = pipeline_dag();
    assert_eq!(dag.dependencies("cleaned_asset"), vec!["raw_asset"]);
    assert_eq!(dag.dependents("cleaned_asset"), vec!["agg_asset"]);
    assert!(dag.dependencies("raw_asset").is_empty());

    let mut ancestors = dag.ancestors("agg_asset");
    ancestors.sort();
    assert_eq!(ancestors, vec!["cleaned_asset", "raw_asset"]);

    let mut descendants = dag.descendants("raw_asset");
    descendants.sort();
    assert_eq!(descendants, vec!["agg_asset", "cleaned_asset"]);

    assert!(dag.ancestors("missing").is_empty());
}

#[test]
fn test_select_all() {
    let dag = pipeline_dag();
    assert_eq!(dag.select(None).unwrap().len(), 3);
    assert_eq!(dag.select(Some("*")).unwrap().len(), 3);
}

#[test]
fn test_select_single_asset() {
    let dag = pipeline_dag();
    assert_eq!(names(&dag.select(Some("cleaned_asset")).unwrap()), vec!["cleaned_asset"]);
}

#[test]
fn test_select_with_upstream() {
    let dag = pipeline_dag();
    assert_eq!(
        names(&dag.select(Some("+cleaned_asset")).unwrap()),
        vec!["raw_asset", "cleaned_asset"]
    );
}

#[test]
fn test_select_with_downstream() {
    let dag = pipeline_dag();
    assert_eq!(
        names(&dag.select(Some("cleaned_asset+")).unwrap()),
        vec!["cleaned_asset", "agg_asset"]
    );
}

#[test]
fn test_select_union_keeps_topological_order() {
    let dag = pipeline_dag();
    assert_eq!(
        names(&dag.select(Some("agg_asset, raw_asset")).unwrap()),
        vec!["raw_asset", "agg_asset"]
    );
}

#[test]
fn test_select_errors() {
    let dag = pipeline_dag();
    assert!(dag.contains("cleaned_asset"));
    assert!(!dag.contains("nope"));
    assert!(matches!(
        dag.select(Some("nope")).unwrap_err(),
        CoreError::AssetNotFound { .. }
    ));
    assert!(matches!(
        dag.select(Some("+")).unwrap_err(),
        CoreError::InvalidSelector { .. }
    ));
}
