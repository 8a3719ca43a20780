//! Error handling for the trait-modeling pipeline.
//!
//! Every failure carries enough context (trait key, column names, cell ids)
//! to diagnose it from the log alone.

use std::io;

use arrow::error::ArrowError;
use itertools::Itertools;
use parquet::errors::ParquetError;

/// Specialized error type for the trait-modeling pipeline
#[derive(Debug, thiserror::Error)]
pub enum TraitModelError {
    /// A required canonical column could not be resolved from any alias
    #[error("Schema error: could not find column for {label}. Tried: {}", .tried.join(", "))]
    SchemaError {
        /// Canonical field being resolved (weight, sex, age, region)
        label: String,
        /// Every alias that was attempted, in order
        tried: Vec<String>,
    },

    /// Two related extracts share no respondent identifier column
    #[error(
        "Schema error: no respondent id column shared by extracts ({} and {} columns)",
        .left_columns,
        .right_columns
    )]
    SharedKeyError {
        /// Number of columns in the left extract
        left_columns: usize,
        /// Number of columns in the right extract
        right_columns: usize,
    },

    /// A trait's label rule does not match the data or the derivation table
    #[error("Config error for trait {trait_key}: {message}")]
    ConfigError {
        /// Trait being configured
        trait_key: String,
        /// What is wrong with the rule
        message: String,
    },

    /// The weighted design is degenerate and cannot be fitted
    #[error("Fit error: {message}")]
    FitError {
        /// Description of the degeneracy
        message: String,
    },

    /// Predicted probabilities are non-finite or outside [0, 1]
    #[error(
        "Range error for trait {trait_key}: {} cell(s) with invalid probability: {}",
        .cell_ids.len(),
        preview(.cell_ids)
    )]
    RangeError {
        /// Trait being validated
        trait_key: String,
        /// Offending cell ids
        cell_ids: Vec<String>,
    },

    /// The implied national prevalence falls outside the configured bounds
    #[error(
        "Plausibility error for trait {trait_key}: implied prevalence {:.2}% is outside bounds [{:.0}%, {:.0}%]. \
         This likely indicates label inversion or incorrect missing value handling.",
        .prevalence * 100.0,
        .min * 100.0,
        .max * 100.0
    )]
    PlausibilityError {
        /// Trait being validated
        trait_key: String,
        /// Computed population-weighted prevalence
        prevalence: f64,
        /// Lower bound (fraction)
        min: f64,
        /// Upper bound (fraction)
        max: f64,
    },

    /// An output does not cover exactly the backbone's cell ids
    #[error(
        "Coverage error for trait {trait_key}: missing cells {}, unexpected cells {}",
        preview(.missing),
        preview(.extra)
    )]
    CoverageError {
        /// Trait being checked
        trait_key: String,
        /// Backbone cell ids without a probability
        missing: Vec<String>,
        /// Cell ids not present in the backbone
        extra: Vec<String>,
    },

    /// The manifest gate failed; every collected problem is listed
    #[error("Manifest validation failed with {} error(s):\n  {}", .errors.len(), .errors.join("\n  "))]
    ManifestError {
        /// One message per problem
        errors: Vec<String>,
    },

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error (de)serializing JSON configuration or artifacts
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid column-name pattern in a label rule
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    /// Error converting between Arrow batches and records
    #[error("Record conversion error: {0}")]
    ConversionError(String),

    /// The per-trait worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    /// A blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

impl TraitModelError {
    /// Create a config error for a trait
    pub fn config(trait_key: &str, message: impl Into<String>) -> Self {
        Self::ConfigError {
            trait_key: trait_key.to_string(),
            message: message.into(),
        }
    }

    /// Create a fit error
    pub fn fit(message: impl Into<String>) -> Self {
        Self::FitError {
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run rather than a single trait
    #[must_use]
    pub const fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaError { .. }
                | Self::SharedKeyError { .. }
                | Self::IoError(_)
                | Self::ParquetError(_)
                | Self::ManifestError { .. }
                | Self::ThreadPoolError(_)
                | Self::TaskError(_)
        )
    }

    /// Whether the trait can be skipped with a warning
    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Whether the error came out of the fitter (eligible for a national retry)
    #[must_use]
    pub const fn is_fit_error(&self) -> bool {
        matches!(self, Self::FitError { .. })
    }
}

/// First few ids of a listing, sorted for stable messages
fn preview(ids: &[String]) -> String {
    const SHOWN: usize = 5;
    if ids.is_empty() {
        return "[]".to_string();
    }
    let shown = ids.iter().sorted().take(SHOWN).join(", ");
    if ids.len() > SHOWN {
        format!("[{shown}, ...]")
    } else {
        format!("[{shown}]")
    }
}

/// Result type for trait-modeling operations
pub type Result<T> = std::result::Result<T, TraitModelError>;
