//! Any-of-conditions labels.
//!
//! A respondent has the trait when any of several diagnosis indicators
//! codes "yes". A definite "no" needs at least one indicator answered "no"
//! and none answered "yes".

use arrow::record_batch::RecordBatch;

use crate::algorithm::covariates::as_code;
use crate::error::{Result, TraitModelError};
use crate::schema::ColumnIndex;
use crate::utils::arrow::numeric_values;

use super::DerivedLabels;
use super::coded::{CodeMap, Verdict};

/// Union of condition indicators sharing one code map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyOfConditionsRule {
    pub variables: Vec<String>,
    pub codes: CodeMap,
}

impl AnyOfConditionsRule {
    /// Combine a row's verdicts; unknown and missing indicators are ignored
    #[must_use]
    pub fn combine<I>(verdicts: I) -> Option<bool>
    where
        I: IntoIterator<Item = Verdict>,
    {
        let mut saw_no = false;
        for verdict in verdicts {
            match verdict {
                Verdict::Yes => return Some(true),
                Verdict::No => saw_no = true,
                Verdict::Unknown => {}
            }
        }
        saw_no.then_some(false)
    }

    /// Derive a label for every row from the indicators present in the extract
    ///
    /// # Errors
    /// `ConfigError` when no indicator variable is present.
    pub fn derive(&self, trait_key: &str, batch: &RecordBatch) -> Result<DerivedLabels> {
        let index = ColumnIndex::from_schema(batch.schema_ref());
        let mut variables = Vec::new();
        let mut indicators = Vec::new();
        for name in &self.variables {
            if let Some(column) = index.get(name) {
                indicators.push(numeric_values(batch, column)?);
                variables.push(column.to_string());
            }
        }
        if indicators.is_empty() {
            return Err(TraitModelError::config(
                trait_key,
                format!(
                    "none of the condition variables [{}] are present",
                    self.variables.join(", ")
                ),
            ));
        }

        let labels = (0..batch.num_rows())
            .map(|row| {
                Self::combine(indicators.iter().map(|column| {
                    as_code(column[row]).map_or(Verdict::Unknown, |code| self.codes.interpret(code))
                }))
            })
            .collect();
        Ok(DerivedLabels { labels, variables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Float64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_combine() {
        use Verdict::{No, Unknown, Yes};
        assert_eq!(AnyOfConditionsRule::combine([No, Yes, Unknown]), Some(true));
        assert_eq!(AnyOfConditionsRule::combine([No, Unknown]), Some(false));
        assert_eq!(AnyOfConditionsRule::combine([Unknown, Unknown]), None);
        assert_eq!(AnyOfConditionsRule::combine(std::iter::empty()), None);
    }

    #[test]
    fn test_derive_over_present_indicators() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("CVDINFR4", DataType::Float64, true),
            Field::new("DIABETE4", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![Some(2.0), Some(2.0), Some(7.0), None])),
                Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0), Some(9.0), Some(2.0)])),
            ],
        )
        .unwrap();
        let rule = AnyOfConditionsRule {
            variables: vec!["CVDINFR4".into(), "CVDCRHD4".into(), "DIABETE4".into()],
            codes: CodeMap::new(&[1], &[2], &[7, 9]),
        };
        let derived = rule.derive("chronic_condition", &batch).unwrap();
        assert_eq!(derived.variables, vec!["CVDINFR4", "DIABETE4"]);
        assert_eq!(derived.labels, vec![Some(true), Some(false), None, Some(false)]);
    }
}
