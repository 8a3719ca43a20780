//! Trait configuration records.
//!
//! One `TraitConfig` per modeled trait, loaded once from a survey's
//! configuration file and never mutated afterwards.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraitModelError};

/// Which derivation strategy a label rule declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Sum minutes across pattern-matched columns and threshold the total
    SummedMinutes,
    /// Interpret the first available preferred variable, then a fallback combination
    PrioritizedCoded,
    /// Positive as soon as any condition flag codes "yes"
    AnyOfConditions,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SummedMinutes => "summed_minutes",
            Self::PrioritizedCoded => "prioritized_coded",
            Self::AnyOfConditions => "any_of_conditions",
        };
        f.write_str(name)
    }
}

/// Parameters of a label-derivation rule as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRuleConfig {
    /// Declared strategy
    pub kind: RuleKind,
    /// Column-name patterns whose minutes are summed
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Patterns consulted only when `patterns` match no column
    #[serde(default)]
    pub fallback_patterns: Vec<String>,
    /// Minutes at or above which the label is positive
    #[serde(default)]
    pub threshold_minutes: Option<f64>,
    /// Preferred coded variables, in priority order
    #[serde(default)]
    pub preferred_vars: Vec<String>,
    /// Variables combined when no preferred variable is available
    #[serde(default)]
    pub fallback: Vec<String>,
    /// Indicator variables for the any-of-conditions strategy
    #[serde(default)]
    pub condition_vars: Vec<String>,
}

/// How the age column is coded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgeCoding {
    /// Age in completed years
    #[default]
    Years,
    /// Five-year age-group codes (1 = 18-24 ... 13 = 80+)
    FiveYearGroup,
}

/// How the region column is coded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegionCoding {
    /// Direct census region code 1-4
    #[default]
    CensusRegion,
    /// State FIPS code mapped through the state-region table
    StateFips,
}

/// Whether region is a model covariate for the trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegionSupport {
    /// Only sex and age band are modeled
    NationalOnly,
    /// Region is modeled alongside sex and age band
    #[default]
    Modeled,
}

impl RegionSupport {
    /// Configuration spelling
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NationalOnly => "national_only",
            Self::Modeled => "modeled",
        }
    }
}

/// Plausible range for a trait's implied national prevalence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct PrevalenceBounds {
    /// Lowest acceptable prevalence (fraction)
    pub min: f64,
    /// Highest acceptable prevalence (fraction)
    pub max: f64,
}

impl PrevalenceBounds {
    /// Create bounds from a lower and upper fraction
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether a prevalence falls inside the closed interval
    #[must_use]
    pub fn contains(&self, prevalence: f64) -> bool {
        prevalence >= self.min && prevalence <= self.max
    }
}

impl Default for PrevalenceBounds {
    fn default() -> Self {
        Self::new(0.01, 0.50)
    }
}

impl From<[f64; 2]> for PrevalenceBounds {
    fn from([min, max]: [f64; 2]) -> Self {
        Self::new(min, max)
    }
}

impl From<PrevalenceBounds> for [f64; 2] {
    fn from(bounds: PrevalenceBounds) -> Self {
        [bounds.min, bounds.max]
    }
}

/// Immutable descriptor of one modeled trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitConfig {
    /// Unique trait id
    pub key: String,
    /// Human-readable label
    pub label: String,
    /// Display group
    #[serde(default = "default_group")]
    pub group: String,
    /// Source survey id
    pub source: String,
    /// Universe description (e.g. "adults 18+")
    #[serde(default)]
    pub universe: String,
    /// Free-text definition recorded in artifact metadata
    #[serde(default)]
    pub definition_notes: String,
    /// Manifest description; falls back to `definition_notes`
    #[serde(default)]
    pub description: Option<String>,
    /// Label-derivation rule
    pub label_rule: LabelRuleConfig,
    /// Aliases for the survey weight
    pub weight_vars: Vec<String>,
    /// Aliases for sex
    pub sex_vars: Vec<String>,
    /// Aliases for age
    pub age_vars: Vec<String>,
    /// Aliases for region (or state)
    #[serde(default, alias = "state_vars")]
    pub region_vars: Vec<String>,
    /// Coding of the age column
    #[serde(default)]
    pub age_coding: AgeCoding,
    /// Coding of the region column
    #[serde(default)]
    pub region_coding: RegionCoding,
    /// Minimum eligible age
    #[serde(rename = "minAge", default = "default_min_age")]
    pub min_age: u32,
    /// Universe label shown to consumers
    #[serde(rename = "universeLabel", default = "default_universe_label")]
    pub universe_label: String,
    /// Region-support mode
    #[serde(rename = "regionSupport", default)]
    pub region_support: RegionSupport,
    /// Plausible prevalence range
    #[serde(default)]
    pub prevalence_bounds: PrevalenceBounds,
}

fn default_group() -> String {
    "Other".to_string()
}

const fn default_min_age() -> u32 {
    18
}

fn default_universe_label() -> String {
    "Adults 18+".to_string()
}

impl TraitConfig {
    /// Manifest description of the trait
    #[must_use]
    pub fn description(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or(self.definition_notes.as_str())
    }
}

/// Contents of a survey's trait configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TraitConfigFile {
    /// Configured traits, in file order
    #[serde(default)]
    pub traits: Vec<TraitConfig>,
}

impl TraitConfigFile {
    /// Load and check a trait configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let file: Self = serde_json::from_str(&text)?;
        file.check()?;
        Ok(file)
    }

    /// Reject duplicate keys and inverted prevalence bounds
    pub fn check(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for trait_cfg in &self.traits {
            if !seen.insert(trait_cfg.key.as_str()) {
                return Err(TraitModelError::config(
                    &trait_cfg.key,
                    "duplicate trait key in configuration",
                ));
            }
            let bounds = trait_cfg.prevalence_bounds;
            if !(0.0..=1.0).contains(&bounds.min)
                || !(0.0..=1.0).contains(&bounds.max)
                || bounds.min > bounds.max
            {
                return Err(TraitModelError::config(
                    &trait_cfg.key,
                    format!(
                        "prevalence_bounds [{}, {}] must be an ordered pair of fractions",
                        bounds.min, bounds.max
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRFSS: &str = r#"{
        "traits": [{
            "key": "smokes",
            "label": "Current smoker",
            "source": "BRFSS 2024",
            "universe": "adults 18+",
            "definition_notes": "Current smoker per _SMOKER3 recode.",
            "label_rule": {
                "kind": "prioritized_coded",
                "preferred_vars": ["_SMOKER3"],
                "fallback": ["SMOKE100", "SMOKDAY2"]
            },
            "weight_vars": ["_LLCPWT"],
            "sex_vars": ["SEXVAR", "_SEX"],
            "age_vars": ["_AGEG5YR"],
            "state_vars": ["_STATE"],
            "age_coding": "five_year_group",
            "region_coding": "state_fips",
            "prevalence_bounds": [0.05, 0.3]
        }]
    }"#;

    #[test]
    fn test_trait_config_defaults_and_aliases() {
        let file: TraitConfigFile = serde_json::from_str(BRFSS).unwrap();
        file.check().unwrap();
        let smokes = &file.traits[0];

        assert_eq!(smokes.group, "Other");
        assert_eq!(smokes.min_age, 18);
        assert_eq!(smokes.universe_label, "Adults 18+");
        assert_eq!(smokes.region_support, RegionSupport::Modeled);
        assert_eq!(smokes.region_vars, vec!["_STATE".to_string()]);
        assert_eq!(smokes.age_coding, AgeCoding::FiveYearGroup);
        assert_eq!(smokes.prevalence_bounds, PrevalenceBounds::new(0.05, 0.3));
        assert_eq!(smokes.label_rule.kind, RuleKind::PrioritizedCoded);
        assert_eq!(smokes.description(), "Current smoker per _SMOKER3 recode.");
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let mut file: TraitConfigFile = serde_json::from_str(BRFSS).unwrap();
        file.traits[0].prevalence_bounds = PrevalenceBounds::new(0.5, 0.1);
        assert!(matches!(
            file.check(),
            Err(TraitModelError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let mut file: TraitConfigFile = serde_json::from_str(BRFSS).unwrap();
        file.traits.push(file.traits[0].clone());
        assert!(file.check().is_err());
    }
}
