//! Summed-minutes threshold labels.
//!
//! Time-use summaries carry one minutes column per activity code. A trait
//! such as "high childcare time" sums every column whose name matches the
//! configured activity patterns and compares the total to a threshold.

use arrow::record_batch::RecordBatch;
use regex::{Regex, RegexBuilder};

use crate::config::LabelRuleConfig;
use crate::error::{Result, TraitModelError};
use crate::schema::column_names;
use crate::utils::arrow::numeric_values;

use super::DerivedLabels;

/// Threshold on minutes summed across pattern-matched columns
#[derive(Debug, Clone)]
pub struct SummedMinutesRule {
    /// Primary column-name patterns (case-insensitive)
    pub patterns: Vec<Regex>,
    /// Patterns tried only when no primary pattern matches
    pub fallback_patterns: Vec<Regex>,
    /// Minutes at or above which the label is positive
    pub threshold_minutes: f64,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Ok(RegexBuilder::new(p).case_insensitive(true).build()?))
        .collect()
}

/// Whether a pattern matches at the start of a column name
fn matches_prefix(pattern: &Regex, column: &str) -> bool {
    pattern.find(column).is_some_and(|m| m.start() == 0)
}

impl SummedMinutesRule {
    /// Build the rule from a trait's label-rule parameters
    pub fn from_config(trait_key: &str, rule: &LabelRuleConfig) -> Result<Self> {
        if rule.patterns.is_empty() {
            return Err(TraitModelError::config(
                trait_key,
                "summed_minutes rule needs at least one column pattern",
            ));
        }
        let threshold_minutes = rule
            .threshold_minutes
            .filter(|t| t.is_finite())
            .ok_or_else(|| {
                TraitModelError::config(trait_key, "summed_minutes rule needs threshold_minutes")
            })?;
        Ok(Self {
            patterns: compile(&rule.patterns)?,
            fallback_patterns: compile(&rule.fallback_patterns)?,
            threshold_minutes,
        })
    }

    /// Columns whose minutes are summed, in extract order
    ///
    /// Patterns are anchored at the start of the column name.
    #[must_use]
    pub fn matching_columns(&self, columns: &[String]) -> Vec<String> {
        let matching = |patterns: &[Regex]| -> Vec<String> {
            columns
                .iter()
                .filter(|c| patterns.iter().any(|p| matches_prefix(p, c)))
                .cloned()
                .collect()
        };
        let primary = matching(&self.patterns);
        if primary.is_empty() {
            matching(&self.fallback_patterns)
        } else {
            primary
        }
    }

    /// Derive a label for every row
    ///
    /// Non-numeric and missing minutes count as zero, so every row gets a
    /// definite label.
    ///
    /// # Errors
    /// `ConfigError` when no column matches any pattern.
    pub fn derive(&self, trait_key: &str, batch: &RecordBatch) -> Result<DerivedLabels> {
        let matched = self.matching_columns(&column_names(batch));
        if matched.is_empty() {
            let tried = self
                .patterns
                .iter()
                .chain(&self.fallback_patterns)
                .map(Regex::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(TraitModelError::config(
                trait_key,
                format!("no columns match minutes patterns [{tried}]"),
            ));
        }

        let mut totals = vec![0.0_f64; batch.num_rows()];
        for column in &matched {
            for (total, minutes) in totals.iter_mut().zip(numeric_values(batch, column)?) {
                *total += minutes.unwrap_or(0.0);
            }
        }

        let labels = totals
            .into_iter()
            .map(|total| Some(total >= self.threshold_minutes))
            .collect();
        Ok(DerivedLabels {
            labels,
            variables: matched,
        })
    }
}
