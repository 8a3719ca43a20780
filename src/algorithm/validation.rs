//! Post-fit validation of trait probabilities.
//!
//! Both checks are hard failures. A prevalence outside its bounds usually
//! means an inverted or mis-derived label, and is never corrected here.

use std::collections::BTreeMap;

use crate::config::PrevalenceBounds;
use crate::error::{Result, TraitModelError};
use crate::models::{Cell, Universe};

/// Cell ids whose probability is non-finite or outside `[0, 1]`
#[must_use]
pub fn out_of_range_cells(prob_by_cell: &BTreeMap<String, f64>) -> Vec<String> {
    prob_by_cell
        .iter()
        .filter(|(_, p)| !p.is_finite() || !(0.0..=1.0).contains(*p))
        .map(|(id, _)| id.clone())
        .collect()
}

/// Population-weighted prevalence over in-universe cells.
///
/// Cells without a probability count as 0. Returns `None` when the
/// universe has no population.
#[must_use]
pub fn national_prevalence(
    prob_by_cell: &BTreeMap<String, f64>,
    cells: &[Cell],
    universe: Universe,
) -> Option<f64> {
    let (weighted, population) = cells
        .iter()
        .filter(|cell| universe.contains(cell))
        .fold((0.0, 0.0), |(weighted, population), cell| {
            let p = prob_by_cell.get(&cell.cell_id).copied().unwrap_or(0.0);
            (weighted + cell.pop * p, population + cell.pop)
        });
    (population > 0.0).then(|| weighted / population)
}

/// Validate a trait's probabilities and return its national prevalence
///
/// # Arguments
/// * `trait_key` - Trait being validated, for error context
/// * `prob_by_cell` - Probability per cell id
/// * `cells` - Backbone cells with populations
/// * `bounds` - Plausible prevalence range
/// * `universe` - Cells the prevalence is computed over
///
/// # Errors
/// `RangeError` naming the offending cells, or `PlausibilityError` when the
/// prevalence is outside `bounds` or the universe is empty.
pub fn validate(
    trait_key: &str,
    prob_by_cell: &BTreeMap<String, f64>,
    cells: &[Cell],
    bounds: PrevalenceBounds,
    universe: Universe,
) -> Result<f64> {
    let offending = out_of_range_cells(prob_by_cell);
    if !offending.is_empty() {
        return Err(TraitModelError::RangeError {
            trait_key: trait_key.to_string(),
            cell_ids: offending,
        });
    }

    let prevalence = national_prevalence(prob_by_cell, cells, universe).unwrap_or(f64::NAN);
    if bounds.contains(prevalence) {
        Ok(prevalence)
    } else {
        Err(TraitModelError::PlausibilityError {
            trait_key: trait_key.to_string(),
            prevalence,
            min: bounds.min,
            max: bounds.max,
        })
    }
}
