//! Survey trait modeling: turns respondent-level survey extracts into
//! per-cell trait probabilities over a fixed population backbone.
//!
//! For every configured trait the pipeline derives a binary label from
//! coded survey variables, fits a survey-weighted logistic regression on
//! sex, age band and (when available) region, predicts every backbone cell
//! and validates the implied national prevalence before publishing.

pub mod algorithm;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod utils;

// Core types
pub use config::{RunConfig, TraitConfig, TraitConfigFile};
pub use error::{Result, TraitModelError};
pub use models::{Cell, CellBackbone, Manifest, TraitOutput};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Pipeline entry points
pub use pipeline::{RunReport, model_survey, publish, run, run_surveys, validate_artifacts};
