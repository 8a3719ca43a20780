//! Tests for fitting and cell prediction on synthetic survey data

use survey_traits::algorithm::labels::DerivationStrategy;
use survey_traits::algorithm::logit::{fit_weighted_logit, predict_cells};
use survey_traits::algorithm::normalize;
use survey_traits::config::FitSettings;
use survey_traits::models::{Cell, CellBackbone, Covariate, Universe};
use survey_traits::schema::{CanonicalColumns, ColumnIndex};
use survey_traits::utils::test::{backbone, health_survey_batch, health_traits};

fn smokes_rows(with_region: bool) -> Vec<survey_traits::models::Respondent> {
    let batch = health_survey_batch(2_000, 11);
    let traits = health_traits();
    let smokes = traits.iter().find(|t| t.key == "smokes").unwrap();
    let columns = CanonicalColumns::resolve(&ColumnIndex::from_schema(batch.schema_ref()), smokes).unwrap();
    let labels = DerivationStrategy::for_trait(smokes)
        .unwrap()
        .unwrap()
        .derive("smokes", &batch)
        .unwrap();
    let table = normalize(&batch, &columns, smokes).unwrap();
    table.model_rows(&labels.labels, with_region)
}

#[test]
fn test_regional_fit_recovers_sex_difference() {
    let rows = smokes_rows(true);
    let fit = fit_weighted_logit(
        &rows,
        &[Covariate::Sex, Covariate::AgeBand, Covariate::Region],
        &FitSettings::default(),
    )
    .unwrap();

    assert!(fit.converged);
    assert_eq!(fit.design_columns().len(), 1 + 1 + 5 + 3);
    assert_eq!(fit.design_columns()[0], "const");
    // fixture smoking rate is 22% for men and 14% for women
    assert!(fit.coefficient("sex_male").unwrap() > 0.0);
}

#[test]
fn test_prediction_realigns_unseen_levels() {
    let rows = smokes_rows(false);
    let fit = fit_weighted_logit(&rows, &[Covariate::Sex, Covariate::AgeBand], &FitSettings::default())
        .unwrap();

    let cell = |id: &str, region: &str, age_band: &str| Cell {
        cell_id: id.to_string(),
        sex: "female".to_string(),
        age_band: age_band.to_string(),
        region: region.to_string(),
        pop: 10.0,
    };
    let cells = CellBackbone::new(vec![
        cell("a", "west", "35_44"),
        // region is not in the design and "pacific" was never observed
        cell("b", "pacific", "35_44"),
        cell("c", "west", "90_plus"),
    ])
    .unwrap();
    let probs = predict_cells(&fit, &cells, Universe::new(18));

    assert_eq!(probs["a"], probs["b"]);
    assert!(probs["c"] > 0.0 && probs["c"] < 1.0);
}

#[test]
fn test_predictions_cover_backbone() {
    let rows = smokes_rows(true);
    let fit = fit_weighted_logit(
        &rows,
        &[Covariate::Sex, Covariate::AgeBand, Covariate::Region],
        &FitSettings::default(),
    )
    .unwrap();
    let backbone = backbone();
    let probs = predict_cells(&fit, &backbone, Universe::new(18));

    let keys: Vec<&str> = probs.keys().map(String::as_str).collect();
    assert_eq!(keys, backbone.ids().into_iter().collect::<Vec<_>>());
    for cell in &backbone.cells {
        let p = probs[&cell.cell_id];
        if cell.age_band == "0_17" {
            assert_eq!(p, 0.0);
        } else {
            assert!(p > 0.0 && p < 1.0);
        }
    }
}
