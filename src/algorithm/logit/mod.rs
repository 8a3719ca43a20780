//! Weighted logistic regression over categorical covariates

pub mod design;
pub mod fit;
pub mod predict;

pub use design::{DesignColumns, DesignTerm, INTERCEPT};
pub use fit::{FitResult, fit_weighted_logit, sigmoid};
pub use predict::{predict_cells, predict_probability, round_probability};
