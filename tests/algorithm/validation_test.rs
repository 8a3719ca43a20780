//! Tests for prevalence validation against the backbone

use std::collections::BTreeMap;

use survey_traits::TraitModelError;
use survey_traits::algorithm::validation::{national_prevalence, validate};
use survey_traits::config::PrevalenceBounds;
use survey_traits::models::Universe;
use survey_traits::utils::test::backbone;

#[test]
fn test_constant_probability_is_the_prevalence() {
    let backbone = backbone();
    let probs: BTreeMap<String, f64> = backbone
        .cells
        .iter()
        .map(|c| (c.cell_id.clone(), if c.age_band == "0_17" { 0.0 } else { 0.25 }))
        .collect();

    let prevalence = national_prevalence(&probs, &backbone.cells, Universe::new(18)).unwrap();
    assert!((prevalence - 0.25).abs() < 1e-12);
    assert!(validate("smokes", &probs, &backbone.cells, PrevalenceBounds::default(), Universe::new(18)).is_ok());
}

#[test]
fn test_inverted_label_is_implausible() {
    let backbone = backbone();
    let probs: BTreeMap<String, f64> = backbone
        .cells
        .iter()
        .map(|c| (c.cell_id.clone(), 0.8))
        .collect();

    let err = validate(
        "smokes",
        &probs,
        &backbone.cells,
        PrevalenceBounds::new(0.05, 0.4),
        Universe::new(18),
    )
    .unwrap_err();
    match err {
        TraitModelError::PlausibilityError { trait_key, prevalence, .. } => {
            assert_eq!(trait_key, "smokes");
            assert!((prevalence - 0.8).abs() < 1e-12);
        }
        other => panic!("expected PlausibilityError, got {other:?}"),
    }
}
