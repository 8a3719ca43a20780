//! Tests for label derivation over survey-shaped extracts

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use survey_traits::algorithm::labels::DerivationStrategy;
use survey_traits::utils::test::{batch_from_columns, health_survey_batch, health_traits, time_use_traits};

fn floats(values: &[Option<f64>]) -> ArrayRef {
    Arc::new(Float64Array::from(values.to_vec()))
}

#[test]
fn test_summed_minutes_threshold() {
    let traits = time_use_traits();
    let strategy = DerivationStrategy::for_trait(&traits[0]).unwrap().unwrap();
    let batch = batch_from_columns(vec![
        ("t030101", floats(&[Some(30.0), Some(10.0)])),
        ("t030102", floats(&[Some(45.0), Some(20.0)])),
        ("t050101", floats(&[Some(600.0), Some(600.0)])),
    ]);

    let derived = strategy.derive("high_childcare_time", &batch).unwrap();
    assert_eq!(derived.labels, vec![Some(true), Some(false)]);
    assert_eq!(derived.variables, vec!["t030101", "t030102"]);
}

#[test]
fn test_unknown_preferred_code_blocks_fallback() {
    let traits = health_traits();
    let smokes = traits.iter().find(|t| t.key == "smokes").unwrap();
    let strategy = DerivationStrategy::for_trait(smokes).unwrap().unwrap();
    let batch = batch_from_columns(vec![
        ("_SMOKER3", floats(&[Some(9.0), None])),
        ("SMOKE100", floats(&[Some(1.0), Some(1.0)])),
        ("SMOKDAY2", floats(&[Some(1.0), Some(1.0)])),
    ]);

    let derived = strategy.derive("smokes", &batch).unwrap();
    // row 0: _SMOKER3 answered "don't know"; row 1: no answer, fallback says yes
    assert_eq!(derived.labels, vec![None, Some(true)]);
}

#[test]
fn test_every_health_trait_labels_every_row() {
    let batch = health_survey_batch(500, 7);
    for trait_cfg in health_traits() {
        let strategy = DerivationStrategy::for_trait(&trait_cfg).unwrap().unwrap();
        let derived = strategy.derive(&trait_cfg.key, &batch).unwrap();
        assert_eq!(derived.labels.len(), 500, "{}", trait_cfg.key);
        assert!(derived.labeled() > 400, "{} labeled too few rows", trait_cfg.key);
        assert!(derived.positives() > 0, "{} has no positives", trait_cfg.key);
    }
}

#[test]
fn test_rule_without_data_is_skippable() {
    let traits = health_traits();
    let active = traits.iter().find(|t| t.key == "physically_active").unwrap();
    let strategy = DerivationStrategy::for_trait(active).unwrap().unwrap();
    let batch = batch_from_columns(vec![("SEXVAR", floats(&[Some(1.0)]))]);

    let err = strategy.derive("physically_active", &batch).unwrap_err();
    assert!(err.is_skippable());
    assert!(err.to_string().contains("_TOTINDA"));
}
