//! End-to-end runs over synthetic extracts written to a temp directory

use survey_traits::models::Manifest;
use survey_traits::utils::io::output::read_json;
use survey_traits::utils::io::read_trait_output;
use survey_traits::utils::test::{backbone, temp_dir, write_run_fixture};
use survey_traits::{TraitConfigFile, TraitModelError, run, validate_artifacts};

#[tokio::test]
async fn test_full_run_writes_artifacts_and_manifest() {
    let dir = temp_dir("full-run").unwrap();
    let config = write_run_fixture(&dir, 2_000, 42).unwrap();

    let (report, manifest) = run(&config).await.unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.outputs.len(), 4);

    let keys: Vec<&str> = manifest.traits.iter().map(|t| t.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["high_childcare_time", "smokes", "physically_active", "chronic_condition"]
    );
    assert_eq!(manifest.traits[0].file, "traits/high_childcare_time.json");

    let written: Manifest = read_json(&config.manifest_path).unwrap();
    assert_eq!(written, manifest);
    let mirrored: Manifest = read_json(config.public_manifest_path.as_ref().unwrap()).unwrap();
    assert_eq!(mirrored, manifest);

    let ids = backbone().ids().into_iter().map(str::to_string).collect::<Vec<_>>();
    for key in keys {
        let output = read_trait_output(&config.output_dir, key).unwrap().unwrap();
        assert_eq!(output.prob_by_cell.keys().cloned().collect::<Vec<_>>(), ids);
        assert!(config.public_output_dir.as_ref().unwrap().join(format!("{key}.json")).exists());
    }

    // merged time-use extract resolves region from the respondent file
    let childcare = &report.outputs["high_childcare_time"];
    assert_eq!(childcare.meta.source, "ATUS");
    assert_eq!(childcare.meta.features, vec!["sex", "age_band", "region"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_rerun_reproduces_probabilities() {
    let dir = temp_dir("rerun").unwrap();
    let config = write_run_fixture(&dir, 1_500, 9).unwrap();

    let (first, _) = run(&config).await.unwrap();
    let (second, _) = run(&config).await.unwrap();
    for (key, output) in &first.outputs {
        assert_eq!(output.prob_by_cell, second.outputs[key].prob_by_cell, "{key}");
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_validate_detects_missing_artifact() {
    let dir = temp_dir("validate").unwrap();
    let config = write_run_fixture(&dir, 1_500, 13).unwrap();
    run(&config).await.unwrap();

    let (outputs, manifest) = validate_artifacts(&config).unwrap();
    assert_eq!(manifest.traits.len(), 4);
    assert_eq!(outputs.len(), 4);
    assert!(outputs.values().all(|o| o.meta.national_prevalence().is_some()));

    std::fs::remove_file(config.output_dir.join("smokes.json")).unwrap();
    match validate_artifacts(&config) {
        Err(TraitModelError::ManifestError { errors }) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("smokes"));
        }
        other => panic!("expected ManifestError, got {other:?}"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_validate_ignores_traits_without_derivation() {
    let dir = temp_dir("validate-unknown").unwrap();
    let config = write_run_fixture(&dir, 1_500, 23).unwrap();
    run(&config).await.unwrap();

    let path = &config.surveys[1].traits_config;
    let mut file = TraitConfigFile::load(path).unwrap();
    let mut boat = file.traits[0].clone();
    boat.key = "owns_boat".to_string();
    file.traits.push(boat);
    std::fs::write(path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

    let (outputs, manifest) = validate_artifacts(&config).unwrap();
    assert_eq!(manifest.traits.len(), 4);
    assert!(!outputs.contains_key("owns_boat"));

    std::fs::remove_dir_all(&dir).ok();
}
