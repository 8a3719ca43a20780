//! Configuration for a trait-modeling run.
//!
//! `RunConfig` is the single immutable run-configuration object handed to
//! every component; nothing in the crate reads paths or settings from
//! process-wide state.

pub mod traits;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use traits::{
    AgeCoding, LabelRuleConfig, PrevalenceBounds, RegionCoding, RegionSupport, RuleKind,
    TraitConfig, TraitConfigFile,
};

/// How per-trait failures affect the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// A failed trait loses only its own output; the manifest gate decides the run
    #[default]
    Isolate,
    /// Any trait failure aborts the whole run
    AbortRun,
}

/// Settings for the iteratively-reweighted least squares fitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Maximum IRLS iterations before giving up on convergence
    pub max_iterations: usize,
    /// Relative deviance change that counts as converged
    pub tolerance: f64,
    /// Relative pivot size below which the weighted design is rank-deficient
    pub rank_tolerance: f64,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            rank_tolerance: 1e-10,
        }
    }
}

/// One survey processed in a run: a trait configuration plus its raw extracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRun {
    /// Path to the `{ "traits": [...] }` configuration file
    pub traits_config: PathBuf,
    /// One extract, or two related extracts merged on their shared respondent id
    pub extracts: Vec<PathBuf>,
    /// Suffix for right-hand columns whose names collide during a merge
    #[serde(default = "default_merge_suffix")]
    pub merge_suffix: String,
}

fn default_merge_suffix() -> String {
    "_sum".to_string()
}

/// Configuration for a complete run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Population cell backbone (JSON)
    pub cells_path: PathBuf,
    /// Directory that receives `<trait>.json` artifacts
    pub output_dir: PathBuf,
    /// Optional mirror directory for published artifacts
    pub public_output_dir: Option<PathBuf>,
    /// Path of the manifest artifact
    pub manifest_path: PathBuf,
    /// Optional mirror path for the published manifest
    pub public_manifest_path: Option<PathBuf>,
    /// Survey year recorded in artifact metadata
    pub year: i32,
    /// How per-trait failures are handled
    pub failure_policy: FailurePolicy,
    /// Worker threads for per-trait processing
    pub threads: usize,
    /// IRLS settings
    pub fit: FitSettings,
    /// Surveys processed in this run, in order
    pub surveys: Vec<SurveyRun>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cells_path: PathBuf::from("data/derived/acs_cells.json"),
            output_dir: PathBuf::from("data/derived/traits"),
            public_output_dir: None,
            manifest_path: PathBuf::from("data/derived/traits_manifest.json"),
            public_manifest_path: None,
            year: 2024,
            failure_policy: FailurePolicy::default(),
            threads: num_cpus::get(),
            fit: FitSettings::default(),
            surveys: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a JSON file
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        if config.threads == 0 {
            config.threads = num_cpus::get();
        }
        Ok(config)
    }

    /// Resolve every relative path against `base`
    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.cells_path);
        join(&mut self.output_dir);
        join(&mut self.manifest_path);
        if let Some(p) = self.public_output_dir.as_mut() {
            join(p);
        }
        if let Some(p) = self.public_manifest_path.as_mut() {
            join(p);
        }
        for survey in &mut self.surveys {
            join(&mut survey.traits_config);
            for extract in &mut survey.extracts {
                join(extract);
            }
        }
    }

    /// Whether a trait failure must abort the run
    #[must_use]
    pub fn aborts_on_trait_failure(&self) -> bool {
        self.failure_policy == FailurePolicy::AbortRun
    }
}
