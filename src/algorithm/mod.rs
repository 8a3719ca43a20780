//! Trait-modeling algorithms
//!
//! Each stage is a pure transformation over the respondent or cell table:
//! covariate normalization, label derivation, weighted logit fitting, cell
//! prediction, prevalence validation and the manifest gate.

pub mod covariates;
pub mod labels;
pub mod logit;
pub mod manifest;
pub mod validation;

pub use covariates::normalize;
pub use labels::{DerivationStrategy, DerivedLabels};
pub use logit::{FitResult, fit_weighted_logit, predict_cells};
pub use manifest::{build_manifest, check_coverage};
pub use validation::{national_prevalence, validate};
