//! Fit, predict and validate one trait.

use std::collections::BTreeMap;

use arrow::record_batch::RecordBatch;
use chrono::Utc;
use log::{debug, info};
use serde_json::json;
use smallvec::SmallVec;

use crate::algorithm::labels::{DerivationStrategy, DerivedLabels};
use crate::algorithm::logit::{FitResult, fit_weighted_logit, predict_cells};
use crate::algorithm::{normalize, validate};
use crate::config::{FitSettings, RegionSupport, TraitConfig};
use crate::error::Result;
use crate::models::{CellBackbone, Covariate, RespondentTable, TraitMeta, TraitOutput, Universe};
use crate::schema::CanonicalColumns;
use crate::utils::logging::log_trait_warning;

/// Model family recorded in artifact metadata
pub const METHOD: &str = "weighted_logit";

/// Everything a trait needs that is shared across the survey's traits
#[derive(Debug, Clone, Copy)]
pub struct TraitContext<'a> {
    pub batch: &'a RecordBatch,
    pub backbone: &'a CellBackbone,
    pub fit: &'a FitSettings,
    pub year: i32,
}

/// Covariate set of a fit
#[must_use]
pub fn covariates(with_region: bool) -> SmallVec<[Covariate; 3]> {
    let mut covariates = SmallVec::from_slice(&[Covariate::Sex, Covariate::AgeBand]);
    if with_region {
        covariates.push(Covariate::Region);
    }
    covariates
}

/// Why a trait configured for regional modeling is fitted nationally,
/// or `None` when region can be modeled
fn region_unavailable(
    trait_cfg: &TraitConfig,
    columns: &CanonicalColumns,
    table: &RespondentTable,
    labels: &[Option<bool>],
) -> Option<String> {
    if trait_cfg.region_support == RegionSupport::NationalOnly {
        return None;
    }
    if columns.region.is_none() {
        return Some(format!(
            "no region column among [{}]",
            trait_cfg.region_vars.join(", ")
        ));
    }
    if table.model_rows(labels, true).is_empty() {
        return Some("no eligible respondents with a known region".to_string());
    }
    None
}

/// Fit with region when possible, retrying nationally once on a fit error
fn fit_with_fallback(
    trait_cfg: &TraitConfig,
    table: &RespondentTable,
    labels: &[Option<bool>],
    with_region: bool,
    settings: &FitSettings,
) -> Result<(FitResult, Option<String>)> {
    let rows = table.model_rows(labels, with_region);
    match fit_weighted_logit(&rows, &covariates(with_region), settings) {
        Ok(fit) => Ok((fit, None)),
        Err(e) if with_region && e.is_fit_error() => {
            log_trait_warning(
                &trait_cfg.key,
                &format!("regional fit failed ({e}); retrying with sex and age band only"),
            );
            let rows = table.model_rows(labels, false);
            let fit = fit_weighted_logit(&rows, &covariates(false), settings)?;
            Ok((fit, Some(format!("regional fit failed: {e}"))))
        }
        Err(e) => Err(e),
    }
}

fn provenance(
    trait_cfg: &TraitConfig,
    strategy: &DerivationStrategy,
    derived: &DerivedLabels,
    fit: &FitResult,
    prevalence: f64,
    national_fallback: Option<String>,
) -> BTreeMap<String, serde_json::Value> {
    let mut provenance = BTreeMap::from([
        ("label_rule".to_string(), json!(strategy.kind().to_string())),
        ("label_columns".to_string(), json!(derived.variables)),
        ("respondents".to_string(), json!(fit.n_obs)),
        ("weighted_respondents".to_string(), json!(fit.sum_weights)),
        ("design_columns".to_string(), json!(fit.design_columns())),
        ("coefficients".to_string(), json!(fit.coefficient_map())),
        ("converged".to_string(), json!(fit.converged)),
        ("iterations".to_string(), json!(fit.iterations)),
        ("national_prevalence".to_string(), json!(prevalence)),
        ("universe".to_string(), json!(trait_cfg.universe)),
    ]);
    if let DerivationStrategy::SummedMinutes(rule) = strategy {
        provenance.insert("threshold_minutes".to_string(), json!(rule.threshold_minutes));
    }
    if let Some(reason) = national_fallback {
        provenance.insert("region_fallback".to_string(), json!(reason));
    }
    provenance
}

/// Derive labels, fit, predict every cell and validate one trait
///
/// # Arguments
/// * `trait_cfg` - The trait being modeled
/// * `strategy` - Its label derivation strategy
/// * `columns` - Canonical columns resolved for the trait
/// * `ctx` - Shared survey inputs and run settings
///
/// # Returns
/// The trait's output artifact; its `prob_by_cell` has exactly the
/// backbone's cell ids as keys.
///
/// # Errors
/// `ConfigError` when the label rule matches no data, `FitError` when the
/// national retry also fails, and `RangeError` / `PlausibilityError` from
/// validation.
pub fn model_trait(
    trait_cfg: &TraitConfig,
    strategy: &DerivationStrategy,
    columns: &CanonicalColumns,
    ctx: TraitContext<'_>,
) -> Result<TraitOutput> {
    let key = trait_cfg.key.as_str();
    let derived = strategy.derive(key, ctx.batch)?;
    let table = normalize(ctx.batch, columns, trait_cfg)?;

    let unavailable = region_unavailable(trait_cfg, columns, &table, &derived.labels);
    if let Some(reason) = &unavailable {
        log_trait_warning(key, &format!("modeling nationally: {reason}"));
    }
    let with_region = trait_cfg.region_support == RegionSupport::Modeled && unavailable.is_none();

    let (fit, retry_reason) =
        fit_with_fallback(trait_cfg, &table, &derived.labels, with_region, ctx.fit)?;
    let national_fallback = retry_reason.or(unavailable);
    let regional = fit.covariates().contains(&Covariate::Region);
    info!(
        "{key}: IRLS {} after {} iterations (deviance {:.4})",
        if fit.converged { "converged" } else { "stopped" },
        fit.iterations,
        fit.deviance
    );
    for (column, value) in fit.design_columns().iter().zip(fit.coefficients.iter()) {
        debug!("{key}: {column:<24} {value:+.6}");
    }

    let universe = Universe::new(trait_cfg.min_age);
    let prob_by_cell = predict_cells(&fit, ctx.backbone, universe);
    let prevalence = validate(
        key,
        &prob_by_cell,
        &ctx.backbone.cells,
        trait_cfg.prevalence_bounds,
        universe,
    )?;
    info!(
        "{key}: fitted on {} respondents ({}), national prevalence {:.2}%",
        fit.n_obs,
        if regional { "regional" } else { "national" },
        prevalence * 100.0
    );

    let region_support = if regional {
        RegionSupport::Modeled
    } else {
        RegionSupport::NationalOnly
    };
    let meta = TraitMeta {
        source: trait_cfg.source.clone(),
        year: ctx.year,
        method: METHOD.to_string(),
        features: fit.covariates().iter().map(|c| c.name().to_string()).collect(),
        generated_at: Utc::now().to_rfc3339(),
        definition: trait_cfg.definition_notes.clone(),
        region_support: Some(region_support.as_str().to_string()),
        provenance: provenance(trait_cfg, strategy, &derived, &fit, prevalence, national_fallback),
    };
    Ok(TraitOutput { meta, prob_by_cell })
}
