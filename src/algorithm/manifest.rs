//! Manifest builder: the final gate of a run.
//!
//! A manifest is only produced when every configured trait has an output
//! that covers exactly the backbone's cells and passes validation. All
//! problems are collected before failing so one run reports them together.

use std::collections::BTreeMap;

use log::info;

use crate::algorithm::validation::validate;
use crate::config::TraitConfig;
use crate::error::{Result, TraitModelError};
use crate::models::{CellBackbone, Manifest, ManifestEntry, TraitOutput, Universe};
use crate::utils::io::output::trait_file_name;

/// Directory prefix of trait artifacts as referenced by the manifest
pub const MANIFEST_FILE_PREFIX: &str = "traits";

/// Check that an output's keys equal the backbone's cell ids
///
/// # Errors
/// `CoverageError` listing missing and unexpected cell ids.
pub fn check_coverage(
    trait_key: &str,
    prob_by_cell: &BTreeMap<String, f64>,
    backbone: &CellBackbone,
) -> Result<()> {
    let expected = backbone.ids();
    let missing: Vec<String> = expected
        .iter()
        .filter(|id| !prob_by_cell.contains_key(**id))
        .map(|id| (*id).to_string())
        .collect();
    let extra: Vec<String> = prob_by_cell
        .keys()
        .filter(|id| !expected.contains(id.as_str()))
        .cloned()
        .collect();
    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(TraitModelError::CoverageError {
            trait_key: trait_key.to_string(),
            missing,
            extra,
        })
    }
}

/// Manifest entry for a trait and its output
#[must_use]
pub fn manifest_entry(trait_cfg: &TraitConfig, output: &TraitOutput) -> ManifestEntry {
    let region_support = output
        .meta
        .region_support
        .clone()
        .unwrap_or_else(|| trait_cfg.region_support.as_str().to_string());
    ManifestEntry {
        key: trait_cfg.key.clone(),
        label: trait_cfg.label.clone(),
        group: trait_cfg.group.clone(),
        source: trait_cfg.source.clone(),
        min_age: trait_cfg.min_age,
        universe_label: trait_cfg.universe_label.clone(),
        region_support,
        description: trait_cfg.description().to_string(),
        file: format!("{MANIFEST_FILE_PREFIX}/{}", trait_file_name(&trait_cfg.key)),
    }
}

/// Build the run manifest from every configured trait and its output
///
/// # Arguments
/// * `traits` - Configured traits, in manifest order
/// * `outputs` - Trait outputs keyed by trait key
/// * `backbone` - The cell backbone every output must cover
///
/// # Errors
/// `ManifestError` listing every missing, incomplete or invalid output.
pub fn build_manifest(
    traits: &[TraitConfig],
    outputs: &BTreeMap<String, TraitOutput>,
    backbone: &CellBackbone,
) -> Result<Manifest> {
    let mut errors = Vec::new();
    let mut entries = Vec::with_capacity(traits.len());

    for trait_cfg in traits {
        let Some(output) = outputs.get(&trait_cfg.key) else {
            errors.push(format!("trait {}: no output artifact", trait_cfg.key));
            continue;
        };
        let checked = check_coverage(&trait_cfg.key, &output.prob_by_cell, backbone).and_then(|()| {
            validate(
                &trait_cfg.key,
                &output.prob_by_cell,
                &backbone.cells,
                trait_cfg.prevalence_bounds,
                Universe::new(trait_cfg.min_age),
            )
        });
        match checked {
            Ok(_) => entries.push(manifest_entry(trait_cfg, output)),
            Err(e) => errors.push(e.to_string()),
        }
    }

    if !errors.is_empty() {
        return Err(TraitModelError::ManifestError { errors });
    }
    info!("Manifest covers {} traits", entries.len());
    Ok(Manifest {
        traits: entries,
        generated_at: backbone.meta.generated_at.clone(),
    })
}
