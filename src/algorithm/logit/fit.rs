//! Survey-weighted binomial logistic regression.
//!
//! The fitter runs iteratively reweighted least squares with the survey
//! weights as frequency weights. Each step solves the weighted normal
//! equations through a Cholesky factorization, which also serves as the
//! rank check on the design.

use std::collections::BTreeMap;

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis, Zip};

use crate::config::FitSettings;
use crate::error::{Result, TraitModelError};
use crate::models::{Covariate, CovariateLevels, Respondent};

use super::design::DesignColumns;

/// Probabilities are kept this far from 0 and 1 inside the iteration
const MU_EPSILON: f64 = 1e-10;

/// A fitted model: coefficients aligned with their design columns
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// One coefficient per design column
    pub coefficients: Array1<f64>,
    /// Columns the coefficients belong to
    pub design: DesignColumns,
    /// IRLS iterations performed
    pub iterations: usize,
    /// Whether the deviance criterion was met
    pub converged: bool,
    /// Final weighted deviance
    pub deviance: f64,
    /// Training rows
    pub n_obs: usize,
    /// Sum of training weights
    pub sum_weights: f64,
}

impl FitResult {
    /// Design column names, intercept first
    #[must_use]
    pub fn design_columns(&self) -> Vec<String> {
        self.design.names()
    }

    /// Coefficient of a named design column
    #[must_use]
    pub fn coefficient(&self, column: &str) -> Option<f64> {
        self.design
            .terms
            .iter()
            .position(|term| term.name() == column)
            .map(|idx| self.coefficients[idx])
    }

    /// Coefficients keyed by design column name
    #[must_use]
    pub fn coefficient_map(&self) -> BTreeMap<String, f64> {
        self.design
            .terms
            .iter()
            .zip(self.coefficients.iter())
            .map(|(term, &value)| (term.name(), value))
            .collect()
    }

    /// Linear predictor for one item
    #[must_use]
    pub fn linear_predictor<T: CovariateLevels + ?Sized>(&self, item: &T) -> f64 {
        self.design.encode_row(item).dot(&self.coefficients)
    }

    /// Covariates the model was fitted on
    #[must_use]
    pub fn covariates(&self) -> &[Covariate] {
        &self.design.covariates
    }
}

/// Logistic function, evaluated without overflow for large `|x|`
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Weighted binomial deviance of binary outcomes
fn deviance(y: &Array1<f64>, mu: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let mut total = 0.0;
    Zip::from(y).and(mu).and(w).for_each(|&y, &mu, &w| {
        let p = if y > 0.5 { mu } else { 1.0 - mu };
        total -= 2.0 * w * p.max(MU_EPSILON).ln();
    });
    total
}

/// Lower-triangular Cholesky factor of a symmetric matrix.
///
/// Returns the index of the first column whose pivot falls below
/// `tolerance` times that column's original diagonal entry.
fn cholesky(a: &Array2<f64>, tolerance: f64) -> std::result::Result<Array2<f64>, usize> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !pivot.is_finite() || pivot <= tolerance * a[[j, j]].abs().max(f64::MIN_POSITIVE) {
            return Err(j);
        }
        let root = pivot.sqrt();
        l[[j, j]] = root;
        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / root;
        }
    }
    Ok(l)
}

/// Solve `L L' x = b` given the Cholesky factor `L`
fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// `X' diag(w) X` and `X' diag(w) z`
fn weighted_normal_equations(
    x: &Array2<f64>,
    w: &Array1<f64>,
    z: &Array1<f64>,
) -> (Array2<f64>, Array1<f64>) {
    let xw = x * &w.view().insert_axis(Axis(1));
    (xw.t().dot(x), xw.t().dot(z))
}

/// Fit `P(label) = sigmoid(X beta)` over the given covariates
///
/// # Arguments
/// * `rows` - Eligible respondents with definite labels
/// * `covariates` - Categorical covariates to dummy-code
/// * `settings` - Iteration limits and tolerances
///
/// # Returns
/// The fitted coefficients. Failing to converge within the iteration limit
/// is logged, not an error.
///
/// # Errors
/// `FitError` when there are no rows, the weighted design is
/// rank-deficient, or the coefficients are not finite.
pub fn fit_weighted_logit(
    rows: &[Respondent],
    covariates: &[Covariate],
    settings: &FitSettings,
) -> Result<FitResult> {
    if rows.is_empty() {
        return Err(TraitModelError::fit("no eligible labeled respondents"));
    }
    let design = DesignColumns::learn(rows, covariates)?;
    let names = design.names();
    let x = design.encode(rows);
    let y: Array1<f64> = rows.iter().map(|r| if r.label { 1.0 } else { 0.0 }).collect();
    let w: Array1<f64> = rows.iter().map(|r| r.weight).collect();
    let sum_weights = w.sum();

    // Rank check on the survey-weighted cross-product
    let (xtwx, _) = weighted_normal_equations(&x, &w, &y);
    if let Err(col) = cholesky(&xtwx, settings.rank_tolerance) {
        return Err(TraitModelError::fit(format!(
            "design matrix is rank-deficient at column '{}' ({} rows, {} columns)",
            names[col],
            rows.len(),
            names.len()
        )));
    }

    let mut mu = y.mapv(|y| (y + 0.5) / 2.0);
    let mut eta = mu.mapv(|m: f64| (m / (1.0 - m)).ln());
    let mut dev = deviance(&y, &mu, &w);
    let mut coefficients = Array1::<f64>::zeros(names.len());
    let mut converged = false;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        iterations += 1;
        let variance = mu.mapv(|m| (m * (1.0 - m)).max(MU_EPSILON));
        let working_weights = &w * &variance;
        let working_response = &eta + &((&y - &mu) / &variance);

        let (lhs, rhs) = weighted_normal_equations(&x, &working_weights, &working_response);
        let factor = cholesky(&lhs, settings.rank_tolerance).map_err(|col| {
            TraitModelError::fit(format!(
                "weighted normal equations became singular at column '{}' (iteration {iterations})",
                names[col]
            ))
        })?;
        coefficients = cholesky_solve(&factor, &rhs);

        eta = x.dot(&coefficients);
        mu = eta.mapv(|e| sigmoid(e).clamp(MU_EPSILON, 1.0 - MU_EPSILON));
        let new_dev = deviance(&y, &mu, &w);
        let change = (new_dev - dev).abs() / (new_dev.abs() + 0.1);
        dev = new_dev;
        if change < settings.tolerance {
            converged = true;
            break;
        }
    }

    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(TraitModelError::fit("non-finite coefficients"));
    }
    if converged {
        debug!(
            "Logit converged after {iterations} iterations (deviance {dev:.4}, {} rows)",
            rows.len()
        );
    } else {
        warn!(
            "Logit did not converge within {} iterations (deviance {dev:.4})",
            settings.max_iterations
        );
    }

    Ok(FitResult {
        coefficients,
        design,
        iterations,
        converged,
        deviance: dev,
        n_obs: rows.len(),
        sum_weights,
    })
}
