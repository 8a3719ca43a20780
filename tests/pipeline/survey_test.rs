//! Tests for modeling all traits of one survey

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use survey_traits::config::{FailurePolicy, RunConfig};
use survey_traits::model_survey;
use survey_traits::utils::test::{backbone, batch_from_columns, health_survey_batch, health_traits};

fn config() -> RunConfig {
    RunConfig {
        threads: 2,
        ..RunConfig::default()
    }
}

#[test]
fn test_every_output_covers_the_backbone() {
    let batch = health_survey_batch(3_000, 21);
    let backbone = backbone();
    let report = model_survey(&health_traits(), &batch, &backbone, &config()).unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.outputs.len(), 3);
    let ids = backbone.ids();
    for (key, output) in &report.outputs {
        let keys: Vec<&str> = output.prob_by_cell.keys().map(String::as_str).collect();
        assert_eq!(keys, ids.iter().copied().collect::<Vec<_>>(), "{key}");
        assert!(output.prob_by_cell.values().all(|p| p.is_finite() && (0.0..=1.0).contains(p)));
        assert_eq!(output.meta.features, vec!["sex", "age_band", "region"]);
        assert_eq!(output.meta.region_support.as_deref(), Some("modeled"));
        assert_eq!(output.meta.method, "weighted_logit");
    }
}

#[test]
fn test_rerun_is_bit_identical() {
    let batch = health_survey_batch(1_500, 5);
    let backbone = backbone();
    let first = model_survey(&health_traits(), &batch, &backbone, &config()).unwrap();
    let second = model_survey(&health_traits(), &batch, &backbone, &config()).unwrap();

    for (key, output) in &first.outputs {
        let again = &second.outputs[key];
        for (cell_id, p) in &output.prob_by_cell {
            assert_eq!(p.to_bits(), again.prob_by_cell[cell_id].to_bits(), "{key} {cell_id}");
        }
    }
}

#[test]
fn test_provenance_records_fit_summary() {
    let batch = health_survey_batch(2_000, 13);
    let report = model_survey(&health_traits(), &batch, &backbone(), &config()).unwrap();

    for (key, output) in &report.outputs {
        let provenance = &output.meta.provenance;
        let design: Vec<&str> = provenance["design_columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c.as_str().unwrap())
            .collect();
        let coefficients = provenance["coefficients"].as_object().unwrap();
        let mut keys: Vec<&str> = coefficients.keys().map(String::as_str).collect();
        let mut expected = design.clone();
        keys.sort_unstable();
        expected.sort_unstable();
        assert_eq!(keys, expected, "{key}");
        assert!(coefficients.values().all(|v| v.as_f64().is_some_and(f64::is_finite)));
        assert!(provenance["iterations"].as_u64().unwrap() >= 1);
        assert!(provenance["converged"].as_bool().unwrap());
        assert!(provenance["national_prevalence"].as_f64().is_some());
    }
}

#[test]
fn test_band_straddling_min_age_is_predicted() {
    let mut traits: Vec<_> = health_traits()
        .into_iter()
        .filter(|t| t.key == "physically_active")
        .collect();
    traits[0].min_age = 21;
    let batch = health_survey_batch(2_000, 17);
    let report = model_survey(&traits, &batch, &backbone(), &config()).unwrap();

    let output = &report.outputs["physically_active"];
    for (cell_id, p) in &output.prob_by_cell {
        if cell_id.contains("|18_24|") {
            assert!(*p > 0.0, "{cell_id}");
        }
        if cell_id.contains("|0_17|") {
            assert_eq!(*p, 0.0, "{cell_id}");
        }
    }
}

/// Every man lives in a western state and every woman in a southern one
fn collinear_region_batch() -> arrow::record_batch::RecordBatch {
    let rows = 600;
    let column = |f: &dyn Fn(usize) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from((0..rows).map(|i| Some(f(i))).collect::<Vec<_>>()))
    };
    batch_from_columns(vec![
        ("SEXVAR", column(&|i| if i % 2 == 0 { 1.0 } else { 2.0 })),
        ("_AGE80", column(&|i| (18 + (i * 7) % 60) as f64)),
        ("_STATE", column(&|i| if i % 2 == 0 { 6.0 } else { 12.0 })),
        ("_LLCPWT", column(&|i| 1.0 + (i % 3) as f64)),
        ("_SMOKER3", column(&|i| if i % 5 == 0 { 1.0 } else { 3.0 })),
    ])
}

#[test]
fn test_rank_deficient_region_falls_back_to_national() {
    let traits: Vec<_> = health_traits().into_iter().filter(|t| t.key == "smokes").collect();
    let report = model_survey(&traits, &collinear_region_batch(), &backbone(), &config()).unwrap();

    let output = &report.outputs["smokes"];
    assert_eq!(output.meta.features, vec!["sex", "age_band"]);
    assert_eq!(output.meta.region_support.as_deref(), Some("national_only"));
    let reason = output.meta.provenance["region_fallback"].as_str().unwrap();
    assert!(reason.contains("regional fit failed"));
}

#[test]
fn test_missing_required_column_aborts_survey() {
    let mut traits = health_traits();
    traits[0].weight_vars = vec!["_NOWEIGHT".to_string()];
    let err = model_survey(&traits, &health_survey_batch(100, 1), &backbone(), &config()).unwrap_err();
    assert!(err.is_run_fatal());
    assert!(err.to_string().contains("_NOWEIGHT"));
}

#[test]
fn test_unrecognized_trait_is_skipped() {
    let mut traits = health_traits();
    let mut extra = traits[0].clone();
    extra.key = "owns_boat".to_string();
    traits.push(extra);

    let report = model_survey(&traits, &health_survey_batch(1_000, 2), &backbone(), &config()).unwrap();
    assert_eq!(report.skipped, vec!["owns_boat"]);
    assert_eq!(report.traits.len(), 3);
    assert!(!report.outputs.contains_key("owns_boat"));
}

#[test]
fn test_failure_policy() {
    let mut traits = health_traits();
    // chronic condition rule pointing at variables the extract lacks
    traits[2].label_rule.condition_vars = vec!["ASTHMA3".to_string()];
    let batch = health_survey_batch(1_000, 3);

    let report = model_survey(&traits, &batch, &backbone(), &config()).unwrap();
    assert_eq!(report.outputs.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].trait_key, "chronic_condition");
    assert!(report.failures[0].error.is_skippable());

    let strict = RunConfig {
        failure_policy: FailurePolicy::AbortRun,
        ..config()
    };
    assert!(model_survey(&traits, &batch, &backbone(), &strict).is_err());
}
