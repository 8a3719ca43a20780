//! Consumer-facing artifacts: per-trait outputs and the run manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata recorded alongside a trait's probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitMeta {
    /// Source survey id
    pub source: String,
    /// Survey year
    pub year: i32,
    /// Model family
    pub method: String,
    /// Covariates used by the final fit
    pub features: Vec<String>,
    /// Generation timestamp (RFC 3339)
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    /// Trait definition
    pub definition: String,
    /// Region support actually used (may be national after a fallback)
    #[serde(rename = "regionSupport", default, skip_serializing_if = "Option::is_none")]
    pub region_support: Option<String>,
    /// Trait-specific provenance
    #[serde(flatten)]
    pub provenance: BTreeMap<String, serde_json::Value>,
}

impl TraitMeta {
    /// Implied national prevalence recorded when the trait was modeled
    #[must_use]
    pub fn national_prevalence(&self) -> Option<f64> {
        self.provenance
            .get("national_prevalence")
            .and_then(serde_json::Value::as_f64)
    }
}

/// A trait's probability per backbone cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitOutput {
    /// Provenance
    pub meta: TraitMeta,
    /// Probability keyed by cell id
    pub prob_by_cell: BTreeMap<String, f64>,
}

/// One trait as listed in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Trait key
    pub key: String,
    /// Trait label
    pub label: String,
    /// Display group
    pub group: String,
    /// Source survey
    pub source: String,
    /// Minimum age of the universe
    #[serde(rename = "minAge")]
    pub min_age: u32,
    /// Universe label
    #[serde(rename = "universeLabel")]
    pub universe_label: String,
    /// `national_only` or `modeled`
    #[serde(rename = "regionSupport")]
    pub region_support: String,
    /// Description
    pub description: String,
    /// Artifact path relative to the derived-data root
    pub file: String,
}

/// The run manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Every configured trait
    pub traits: Vec<ManifestEntry>,
    /// Generation timestamp of the backbone the outputs cover
    #[serde(rename = "generatedAt")]
    pub generated_at: Option<String>,
}
