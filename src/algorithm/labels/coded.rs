//! Prioritized coded-variable labels.
//!
//! Survey instruments often ask the same question through several
//! variables: a computed summary, the raw item, and older item pairs kept
//! for backwards compatibility. The rule reads the preferred variables in
//! order and only combines the fallback items when no preferred variable
//! answers the row.

use arrow::record_batch::RecordBatch;
use smallvec::SmallVec;

use crate::algorithm::covariates::as_code;
use crate::error::{Result, TraitModelError};
use crate::schema::ColumnIndex;
use crate::utils::arrow::numeric_values;

use super::DerivedLabels;

/// What a single code means for a binary trait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Positive answer
    Yes,
    /// Negative answer
    No,
    /// Don't know, refused, or an unmapped code
    Unknown,
}

impl Verdict {
    /// Label carried by this verdict
    #[must_use]
    pub const fn label(self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Partition of a coded variable's values into yes / no / unknown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMap {
    pub yes: SmallVec<[i64; 4]>,
    pub no: SmallVec<[i64; 4]>,
    pub unknown: SmallVec<[i64; 4]>,
}

impl CodeMap {
    #[must_use]
    pub fn new(yes: &[i64], no: &[i64], unknown: &[i64]) -> Self {
        Self {
            yes: SmallVec::from_slice(yes),
            no: SmallVec::from_slice(no),
            unknown: SmallVec::from_slice(unknown),
        }
    }

    /// Interpret one code. Codes outside every set are treated as unknown.
    #[must_use]
    pub fn interpret(&self, code: i64) -> Verdict {
        if self.yes.contains(&code) {
            Verdict::Yes
        } else if self.no.contains(&code) {
            Verdict::No
        } else {
            Verdict::Unknown
        }
    }
}

/// One clause of a fallback combination: every listed variable must carry
/// one of its accepted codes for the clause to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackClause {
    /// `(index into FallbackCombination::variables, accepted codes)`
    pub conditions: SmallVec<[(usize, SmallVec<[i64; 4]>); 2]>,
    /// Label when the clause applies
    pub label: bool,
}

impl FallbackClause {
    #[must_use]
    pub fn new(conditions: &[(usize, &[i64])], label: bool) -> Self {
        Self {
            conditions: conditions
                .iter()
                .map(|(idx, codes)| (*idx, SmallVec::from_slice(codes)))
                .collect(),
            label,
        }
    }

    fn applies(&self, codes: &[i64]) -> bool {
        self.conditions
            .iter()
            .all(|(idx, accepted)| codes.get(*idx).is_some_and(|c| accepted.contains(c)))
    }
}

/// Fallback combination over several raw items, clauses checked in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCombination {
    pub variables: Vec<String>,
    pub clauses: Vec<FallbackClause>,
}

impl FallbackCombination {
    /// Evaluate the clauses for one row's codes; no matching clause is `None`
    #[must_use]
    pub fn evaluate(&self, codes: &[i64]) -> Option<bool> {
        self.clauses
            .iter()
            .find(|clause| clause.applies(codes))
            .map(|clause| clause.label)
    }
}

/// Preferred variables in priority order, then an optional fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritizedCodedRule {
    pub preferred: Vec<String>,
    pub codes: CodeMap,
    pub fallback: Option<FallbackCombination>,
}

impl PrioritizedCodedRule {
    /// Derive a label for every row
    ///
    /// For each row the first preferred variable that exists and is not
    /// missing decides the label; an unknown code there yields `None` and
    /// does not fall through. The fallback combination is consulted only
    /// when no preferred variable carries a value for the row, and only if
    /// every fallback variable exists in the extract.
    ///
    /// # Errors
    /// `ConfigError` when neither a preferred variable nor the complete
    /// fallback set is present in the extract.
    pub fn derive(&self, trait_key: &str, batch: &RecordBatch) -> Result<DerivedLabels> {
        let index = ColumnIndex::from_schema(batch.schema_ref());
        let mut variables = Vec::new();

        let mut preferred = Vec::with_capacity(self.preferred.len());
        for name in &self.preferred {
            if let Some(column) = index.get(name) {
                preferred.push(numeric_values(batch, column)?);
                variables.push(column.to_string());
            }
        }

        let fallback = match &self.fallback {
            Some(combination) => {
                let resolved: Option<Vec<&str>> = combination
                    .variables
                    .iter()
                    .map(|name| index.get(name))
                    .collect();
                match resolved {
                    Some(columns) => {
                        let mut values = Vec::with_capacity(columns.len());
                        for column in columns {
                            values.push(numeric_values(batch, column)?);
                            variables.push(column.to_string());
                        }
                        Some((combination, values))
                    }
                    None => None,
                }
            }
            None => None,
        };

        if preferred.is_empty() && fallback.is_none() {
            let mut tried = self.preferred.clone();
            if let Some(combination) = &self.fallback {
                tried.extend(combination.variables.iter().cloned());
            }
            return Err(TraitModelError::config(
                trait_key,
                format!("none of the coded variables [{}] are present", tried.join(", ")),
            ));
        }

        let labels = (0..batch.num_rows())
            .map(|row| {
                for column in &preferred {
                    if column[row].is_none() {
                        continue;
                    }
                    return as_code(column[row])
                        .map_or(Verdict::Unknown, |code| self.codes.interpret(code))
                        .label();
                }
                let (combination, values) = fallback.as_ref()?;
                let codes: Option<SmallVec<[i64; 4]>> =
                    values.iter().map(|column| as_code(column[row])).collect();
                combination.evaluate(&codes?)
            })
            .collect();

        Ok(DerivedLabels { labels, variables })
    }
}
