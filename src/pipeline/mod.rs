//! Run driver
//!
//! Loads each survey's extracts, resolves schemas, models every trait on a
//! worker pool and hands the outputs to the manifest gate.

pub mod trait_model;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use log::{error, info, warn};
use rayon::prelude::*;

use crate::algorithm::build_manifest;
use crate::algorithm::labels::DerivationStrategy;
use crate::config::{RunConfig, SurveyRun, TraitConfig, TraitConfigFile};
use crate::error::{Result, TraitModelError};
use crate::models::{CellBackbone, Manifest, TraitOutput};
use crate::schema::{CanonicalColumns, ColumnIndex, merge_extracts};
use crate::utils::io::{read_extracts_async, read_trait_output, write_manifest, write_trait_output};
use crate::utils::logging::{
    create_trait_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
};

pub use trait_model::{METHOD, TraitContext, model_trait};

/// A trait that produced no output, and why
#[derive(Debug)]
pub struct TraitFailure {
    pub trait_key: String,
    pub error: TraitModelError,
}

/// Result of modeling one or more surveys
#[derive(Debug, Default)]
pub struct RunReport {
    /// Traits with a derivation strategy, in configuration order
    pub traits: Vec<TraitConfig>,
    /// Successful outputs keyed by trait key
    pub outputs: BTreeMap<String, TraitOutput>,
    /// Traits that failed, in configuration order
    pub failures: Vec<TraitFailure>,
    /// Configured keys without a derivation strategy
    pub skipped: Vec<String>,
}

impl RunReport {
    fn absorb(&mut self, other: Self) {
        self.traits.extend(other.traits);
        self.outputs.extend(other.outputs);
        self.failures.extend(other.failures);
        self.skipped.extend(other.skipped);
    }
}

/// Load a survey's extracts, merging related extracts on their shared id
pub async fn load_survey_extract(survey: &SurveyRun) -> Result<RecordBatch> {
    let mut batches = read_extracts_async(&survey.extracts).await?.into_iter();
    let first = batches.next().ok_or_else(|| {
        TraitModelError::ConversionError("survey has no extracts configured".to_string())
    })?;
    batches.try_fold(first, |merged, next| {
        merge_extracts(&merged, &next, &survey.merge_suffix)
    })
}

/// Model every trait of one survey against its extract
///
/// Canonical columns for every trait are resolved before any trait is
/// modeled, so a `SchemaError` aborts the run without partial outputs.
///
/// # Errors
/// Run-fatal errors only: schema resolution, the worker pool, and any
/// trait failure under the abort-run policy.
pub fn model_survey(
    traits: &[TraitConfig],
    batch: &RecordBatch,
    backbone: &CellBackbone,
    config: &RunConfig,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let index = ColumnIndex::from_schema(batch.schema_ref());

    // (trait, strategy or its config error, resolved columns)
    let mut jobs = Vec::new();
    for trait_cfg in traits {
        let strategy = match DerivationStrategy::for_trait(trait_cfg) {
            Ok(Some(strategy)) => Ok(strategy),
            Ok(None) => {
                report.skipped.push(trait_cfg.key.clone());
                continue;
            }
            Err(e) => Err(e),
        };
        let columns = CanonicalColumns::resolve(&index, trait_cfg)?;
        report.traits.push(trait_cfg.clone());
        jobs.push((trait_cfg, strategy, columns));
    }

    let ctx = TraitContext {
        batch,
        backbone,
        fit: &config.fit,
        year: config.year,
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let pb = create_trait_progress_bar(jobs.len() as u64, Some("modeling traits"));
    let results: Vec<(String, Result<TraitOutput>)> = pool.install(|| {
        jobs.into_par_iter()
            .map(|(trait_cfg, strategy, columns)| {
                let result =
                    strategy.and_then(|strategy| model_trait(trait_cfg, &strategy, &columns, ctx));
                pb.inc(1);
                (trait_cfg.key.clone(), result)
            })
            .collect()
    });
    finish_progress_bar(&pb, Some("traits modeled"));

    for (trait_key, result) in results {
        match result {
            Ok(output) => {
                report.outputs.insert(trait_key, output);
            }
            Err(e) if config.aborts_on_trait_failure() || e.is_run_fatal() => {
                error!("[{trait_key}] {e}");
                return Err(e);
            }
            Err(e) => {
                if e.is_skippable() {
                    warn!("[{trait_key}] skipped: {e}");
                } else {
                    error!("[{trait_key}] failed: {e}");
                }
                report.failures.push(TraitFailure {
                    trait_key,
                    error: e,
                });
            }
        }
    }
    Ok(report)
}

/// Model every configured survey
pub async fn run_surveys(config: &RunConfig, backbone: &CellBackbone) -> Result<RunReport> {
    let mut report = RunReport::default();
    let shared = Arc::new((config.clone(), backbone.clone()));
    for survey in &config.surveys {
        let start = Instant::now();
        log_operation_start("Modeling traits from", &survey.traits_config);
        let traits = TraitConfigFile::load(&survey.traits_config)?;
        let batch = load_survey_extract(survey).await?;
        info!(
            "Survey extract has {} rows and {} columns",
            batch.num_rows(),
            batch.num_columns()
        );
        let shared = Arc::clone(&shared);
        let survey_report = tokio::task::spawn_blocking(move || {
            let (config, backbone) = shared.as_ref();
            model_survey(&traits.traits, &batch, backbone, config)
        })
        .await??;
        log_operation_complete(
            "modeled",
            &survey.traits_config,
            survey_report.outputs.len(),
            Some(start.elapsed()),
        );
        report.absorb(survey_report);
    }
    for key in &report.skipped {
        warn!("Trait '{key}' has no label derivation and was skipped");
    }
    Ok(report)
}

/// Write every output artifact, then gate the run on the manifest
///
/// Outputs are written even when the manifest gate fails, so the valid
/// traits of a partially failed run can be inspected.
///
/// # Errors
/// `ManifestError` when any trait lacks a valid output.
pub fn publish(config: &RunConfig, backbone: &CellBackbone, report: &RunReport) -> Result<Manifest> {
    for (key, output) in &report.outputs {
        write_trait_output(
            &config.output_dir,
            config.public_output_dir.as_deref(),
            key,
            output,
        )?;
    }
    let manifest = build_manifest(&report.traits, &report.outputs, backbone)?;
    write_manifest(
        &config.manifest_path,
        config.public_manifest_path.as_deref(),
        &manifest,
    )?;
    Ok(manifest)
}

/// Full run: model every survey, write artifacts and the manifest
pub async fn run(config: &RunConfig) -> Result<(RunReport, Manifest)> {
    let backbone = CellBackbone::load(&config.cells_path)?;
    let report = run_surveys(config, &backbone).await?;
    let manifest = publish(config, &backbone, &report)?;
    Ok((report, manifest))
}

/// Re-validate the artifacts already on disk and rewrite the manifest
///
/// Every configured trait with a derivation strategy must have an artifact
/// in the output directory. Returns the artifacts read, keyed by trait.
pub fn validate_artifacts(
    config: &RunConfig,
) -> Result<(BTreeMap<String, TraitOutput>, Manifest)> {
    let backbone = CellBackbone::load(&config.cells_path)?;
    let mut traits = Vec::new();
    let mut outputs = BTreeMap::new();
    for survey in &config.surveys {
        for trait_cfg in TraitConfigFile::load(&survey.traits_config)?.traits {
            // misconfigured rules still need an artifact; only unknown keys drop out
            if matches!(DerivationStrategy::for_trait(&trait_cfg), Ok(None)) {
                continue;
            }
            if let Some(output) = read_trait_output(&config.output_dir, &trait_cfg.key)? {
                outputs.insert(trait_cfg.key.clone(), output);
            }
            traits.push(trait_cfg);
        }
    }
    let manifest = build_manifest(&traits, &outputs, &backbone)?;
    write_manifest(
        &config.manifest_path,
        config.public_manifest_path.as_deref(),
        &manifest,
    )?;
    Ok((outputs, manifest))
}
