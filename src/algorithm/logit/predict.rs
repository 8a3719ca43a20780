//! Cell-level prediction from a fitted model.

use std::collections::BTreeMap;

use crate::models::{CellBackbone, CovariateLevels, Universe};

use super::fit::{FitResult, sigmoid};

/// Decimal places kept in published probabilities
pub const PROBABILITY_DECIMALS: i32 = 6;

/// Round a probability to the published precision
#[must_use]
pub fn round_probability(p: f64) -> f64 {
    let scale = 10_f64.powi(PROBABILITY_DECIMALS);
    (p * scale).round() / scale
}

/// Predicted probability for one item, clipped to `[0, 1]`
///
/// A NaN linear predictor stays NaN so validation can reject it.
#[must_use]
pub fn predict_probability<T: CovariateLevels + ?Sized>(fit: &FitResult, item: &T) -> f64 {
    sigmoid(fit.linear_predictor(item)).clamp(0.0, 1.0)
}

/// Predict every backbone cell
///
/// Cells outside the universe get probability 0. The result has exactly one
/// entry per backbone cell.
#[must_use]
pub fn predict_cells(
    fit: &FitResult,
    backbone: &CellBackbone,
    universe: Universe,
) -> BTreeMap<String, f64> {
    backbone
        .cells
        .iter()
        .map(|cell| {
            let p = if universe.contains(cell) {
                round_probability(predict_probability(fit, cell))
            } else {
                0.0
            };
            (cell.cell_id.clone(), p)
        })
        .collect()
}
