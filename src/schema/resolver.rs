//! Alias resolution from survey-specific column names to canonical fields.
//!
//! Codebooks rename variables between years and instruments, so every
//! canonical field is configured as an ordered list of candidate names.
//! Downstream code only ever sees the resolved names.

use arrow::datatypes::Schema;
use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap;

use crate::config::TraitConfig;
use crate::error::{Result, TraitModelError};

/// Identifier columns known to link related extracts, tried in order
pub const KNOWN_RESPONDENT_IDS: [&str; 3] = ["TUCASEID", "TUCASE_ID", "TUID"];

/// Case-insensitive lookup over an extract's column names
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    by_upper: FxHashMap<String, String>,
}

impl ColumnIndex {
    /// Index a list of column names; the first spelling of a name wins
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_upper = FxHashMap::default();
        for column in columns {
            let column = column.as_ref();
            by_upper
                .entry(column.to_uppercase())
                .or_insert_with(|| column.to_string());
        }
        Self { by_upper }
    }

    /// Index the fields of an Arrow schema
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(schema.fields().iter().map(|f| f.name().as_str()))
    }

    /// Original spelling of `name`, matched case-insensitively
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_upper.get(&name.to_uppercase()).map(String::as_str)
    }

    /// Whether `name` exists (case-insensitive)
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every original column name, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.by_upper.values().map(String::as_str).sorted().collect()
    }
}

/// Resolve the first candidate present in `columns`
///
/// # Errors
/// `SchemaError` naming every candidate when none matches.
pub fn resolve(columns: &ColumnIndex, candidates: &[String], label: &str) -> Result<String> {
    candidates
        .iter()
        .find_map(|candidate| columns.get(candidate))
        .map(|found| {
            debug!("Resolved {label} column: {found}");
            found.to_string()
        })
        .ok_or_else(|| TraitModelError::SchemaError {
            label: label.to_string(),
            tried: candidates.to_vec(),
        })
}

/// Resolve an optional field, `None` when no candidate matches
#[must_use]
pub fn resolve_optional(columns: &ColumnIndex, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find_map(|candidate| columns.get(candidate))
        .map(str::to_string)
}

/// Find the respondent-id column shared by two extracts
///
/// Known identifier names are tried first; otherwise the alphabetically
/// first column name present in both extracts is used.
///
/// # Errors
/// `SharedKeyError` when the extracts have no column in common.
pub fn detect_shared_key<A, B>(left: &[A], right: &[B]) -> Result<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let left: Vec<&str> = left.iter().map(|c| c.as_ref()).collect();
    let right: Vec<&str> = right.iter().map(|c| c.as_ref()).collect();

    if let Some(known) = KNOWN_RESPONDENT_IDS
        .into_iter()
        .find(|name| left.contains(name) && right.contains(name))
    {
        return Ok(known.to_string());
    }

    left.iter()
        .filter(|name| right.contains(name))
        .sorted()
        .next()
        .map(|name| (*name).to_string())
        .ok_or(TraitModelError::SharedKeyError {
            left_columns: left.len(),
            right_columns: right.len(),
        })
}

/// Canonical columns resolved for one trait
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalColumns {
    /// Survey weight
    pub weight: String,
    /// Sex
    pub sex: String,
    /// Age
    pub age: String,
    /// Region or state; `None` when no alias resolves
    pub region: Option<String>,
}

impl CanonicalColumns {
    /// Resolve the canonical columns a trait configures
    ///
    /// Weight, sex and age are required. Region is optional: when it cannot
    /// be resolved the trait is modeled nationally.
    pub fn resolve(columns: &ColumnIndex, trait_cfg: &TraitConfig) -> Result<Self> {
        Ok(Self {
            weight: resolve(columns, &trait_cfg.weight_vars, "weight")?,
            sex: resolve(columns, &trait_cfg.sex_vars, "sex")?,
            age: resolve(columns, &trait_cfg.age_vars, "age")?,
            region: resolve_optional(columns, &trait_cfg.region_vars),
        })
    }
}
