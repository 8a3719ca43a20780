//! Test helper functions

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{RunConfig, SurveyRun, TraitConfig, TraitConfigFile};
use crate::error::Result;
use crate::utils::io::output::write_json;
use crate::utils::io::write_extract;

use super::fixtures::{backbone, health_survey_batch, health_traits, time_use_batches, time_use_traits};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh, empty directory under the system temp dir
pub fn temp_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!(
        "survey-traits-{name}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn write_traits(path: &Path, traits: Vec<TraitConfig>) -> Result<()> {
    write_json(path, &TraitConfigFile { traits })
}

/// Write a complete two-survey run (backbone, configs, extracts) into `dir`
///
/// The returned configuration uses absolute paths inside `dir` and a
/// single worker thread.
pub fn write_run_fixture(dir: &Path, rows: usize, seed: u64) -> Result<RunConfig> {
    let cells_path = dir.join("acs_cells.json");
    write_json(&cells_path, &backbone())?;

    let health_config = dir.join("brfss_traits.json");
    write_traits(&health_config, health_traits())?;
    let health_extract = dir.join("brfss.parquet");
    write_extract(&health_extract, &health_survey_batch(rows, seed))?;

    let time_use_config = dir.join("atus_traits.json");
    write_traits(&time_use_config, time_use_traits())?;
    let (respondents, summary) = time_use_batches(rows, seed.wrapping_add(1));
    let respondent_extract = dir.join("atusresp.parquet");
    let summary_extract = dir.join("atussum.parquet");
    write_extract(&respondent_extract, &respondents)?;
    write_extract(&summary_extract, &summary)?;

    Ok(RunConfig {
        cells_path,
        output_dir: dir.join("derived").join("traits"),
        public_output_dir: Some(dir.join("public").join("traits")),
        manifest_path: dir.join("derived").join("traits_manifest.json"),
        public_manifest_path: Some(dir.join("public").join("traits_manifest.json")),
        threads: 1,
        surveys: vec![
            SurveyRun {
                traits_config: time_use_config,
                extracts: vec![respondent_extract, summary_extract],
                merge_suffix: "_sum".to_string(),
            },
            SurveyRun {
                traits_config: health_config,
                extracts: vec![health_extract],
                merge_suffix: "_sum".to_string(),
            },
        ],
        ..RunConfig::default()
    })
}
