//! Label derivation engine
//!
//! Maps each recognized trait key to one derivation strategy. The mapping
//! is fixed: configuration supplies the strategy's parameters (variable
//! names, patterns, thresholds) but cannot attach a strategy to a new key.

pub mod coded;
pub mod conditions;
pub mod minutes;

use arrow::record_batch::RecordBatch;
use log::{debug, warn};

use crate::config::{RuleKind, TraitConfig};
use crate::error::{Result, TraitModelError};

pub use coded::{CodeMap, FallbackClause, FallbackCombination, PrioritizedCodedRule, Verdict};
pub use conditions::AnyOfConditionsRule;
pub use minutes::SummedMinutesRule;

/// Per-row labels together with the extract columns that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedLabels {
    /// `Some(true)` / `Some(false)` or `None` when undeterminable
    pub labels: Vec<Option<bool>>,
    /// Columns read, in the order they were consulted
    pub variables: Vec<String>,
}

impl DerivedLabels {
    /// Number of rows with a definite label
    #[must_use]
    pub fn labeled(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    /// Number of positive labels
    #[must_use]
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|l| **l == Some(true)).count()
    }
}

/// Derivation strategy bound to one trait
#[derive(Debug, Clone)]
pub enum DerivationStrategy {
    SummedMinutes(SummedMinutesRule),
    PrioritizedCoded(PrioritizedCodedRule),
    AnyOfConditions(AnyOfConditionsRule),
}

/// Smoking status: current-smoker recodes, with the ever-smoked /
/// smoke-now item pair as fallback
fn smoking_rule(trait_cfg: &TraitConfig) -> Result<PrioritizedCodedRule> {
    let rule = &trait_cfg.label_rule;
    let fallback = match rule.fallback.as_slice() {
        [] => None,
        [ever, now] => Some(FallbackCombination {
            variables: vec![ever.clone(), now.clone()],
            clauses: vec![
                FallbackClause::new(&[(0, &[1]), (1, &[1, 2])], true),
                FallbackClause::new(&[(0, &[2])], false),
                FallbackClause::new(&[(1, &[3])], false),
            ],
        }),
        other => {
            return Err(TraitModelError::config(
                &trait_cfg.key,
                format!(
                    "smoking fallback needs exactly two variables (ever smoked, smoke now), got {}",
                    other.len()
                ),
            ));
        }
    };
    Ok(PrioritizedCodedRule {
        preferred: rule.preferred_vars.clone(),
        codes: CodeMap::new(&[1], &[2, 3, 4], &[9]),
        fallback,
    })
}

fn expect_kind(trait_cfg: &TraitConfig, expected: RuleKind) -> Result<()> {
    if trait_cfg.label_rule.kind == expected {
        Ok(())
    } else {
        Err(TraitModelError::config(
            &trait_cfg.key,
            format!(
                "label rule kind {} does not match the {expected} derivation for this trait",
                trait_cfg.label_rule.kind
            ),
        ))
    }
}

impl DerivationStrategy {
    /// Strategy for a trait, or `None` for an unrecognized key
    ///
    /// # Errors
    /// `ConfigError` when the configured rule kind disagrees with the key's
    /// strategy or its parameters are incomplete.
    pub fn for_trait(trait_cfg: &TraitConfig) -> Result<Option<Self>> {
        let rule = &trait_cfg.label_rule;
        let strategy = match trait_cfg.key.as_str() {
            "high_childcare_time" => {
                expect_kind(trait_cfg, RuleKind::SummedMinutes)?;
                Self::SummedMinutes(SummedMinutesRule::from_config(&trait_cfg.key, rule)?)
            }
            "smokes" => {
                expect_kind(trait_cfg, RuleKind::PrioritizedCoded)?;
                Self::PrioritizedCoded(smoking_rule(trait_cfg)?)
            }
            "physically_active" => {
                expect_kind(trait_cfg, RuleKind::PrioritizedCoded)?;
                Self::PrioritizedCoded(PrioritizedCodedRule {
                    preferred: rule.preferred_vars.clone(),
                    codes: CodeMap::new(&[1], &[2], &[7, 9]),
                    fallback: None,
                })
            }
            "chronic_condition" => {
                expect_kind(trait_cfg, RuleKind::AnyOfConditions)?;
                if rule.condition_vars.is_empty() {
                    return Err(TraitModelError::config(
                        &trait_cfg.key,
                        "any_of_conditions rule needs condition_vars",
                    ));
                }
                Self::AnyOfConditions(AnyOfConditionsRule {
                    variables: rule.condition_vars.clone(),
                    codes: CodeMap::new(&[1], &[2], &[7, 9]),
                })
            }
            other => {
                warn!("No label derivation for trait '{other}', skipping");
                return Ok(None);
            }
        };
        Ok(Some(strategy))
    }

    /// Kind of this strategy
    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        match self {
            Self::SummedMinutes(_) => RuleKind::SummedMinutes,
            Self::PrioritizedCoded(_) => RuleKind::PrioritizedCoded,
            Self::AnyOfConditions(_) => RuleKind::AnyOfConditions,
        }
    }

    /// Derive one label per extract row
    pub fn derive(&self, trait_key: &str, batch: &RecordBatch) -> Result<DerivedLabels> {
        let derived = match self {
            Self::SummedMinutes(rule) => rule.derive(trait_key, batch)?,
            Self::PrioritizedCoded(rule) => rule.derive(trait_key, batch)?,
            Self::AnyOfConditions(rule) => rule.derive(trait_key, batch)?,
        };
        debug!(
            "{trait_key}: {} of {} rows labeled, {} positive (columns: {})",
            derived.labeled(),
            derived.labels.len(),
            derived.positives(),
            derived.variables.join(", ")
        );
        Ok(derived)
    }
}
