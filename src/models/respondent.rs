//! Normalized respondent records.

use crate::models::demographics::{AgeBand, Covariate, CovariateLevels, Region, Sex};

/// Canonical covariates for every row of a survey extract, column-wise.
///
/// Row `i` of each column corresponds to row `i` of the raw extract; a
/// `None` marks a missing or ineligible value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RespondentTable {
    /// Sex per row
    pub sex: Vec<Option<Sex>>,
    /// Age band per row
    pub age_band: Vec<Option<AgeBand>>,
    /// Region per row (all `None` when fitting nationally)
    pub region: Vec<Option<Region>>,
    /// Survey weight per row
    pub weight: Vec<Option<f64>>,
}

impl RespondentTable {
    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.weight.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }

    /// Whether row `i` may enter a fit: positive weight and every required
    /// covariate present (region only when `with_region`)
    #[must_use]
    pub fn is_eligible(&self, i: usize, with_region: bool) -> bool {
        self.weight[i].is_some_and(|w| w.is_finite() && w > 0.0)
            && self.sex[i].is_some()
            && self.age_band[i].is_some()
            && (!with_region || self.region[i].is_some())
    }

    /// Count of rows with a known region
    #[must_use]
    pub fn region_coverage(&self) -> usize {
        self.region.iter().filter(|r| r.is_some()).count()
    }

    /// Eligible respondents joined with their derived labels.
    ///
    /// Rows whose label is `None` are excluded, not imputed.
    #[must_use]
    pub fn model_rows(&self, labels: &[Option<bool>], with_region: bool) -> Vec<Respondent> {
        (0..self.len())
            .filter(|&i| self.is_eligible(i, with_region))
            .filter_map(|i| {
                let label = labels.get(i).copied().flatten()?;
                Some(Respondent {
                    sex: self.sex[i]?,
                    age_band: self.age_band[i]?,
                    region: if with_region { self.region[i] } else { None },
                    weight: self.weight[i]?,
                    label,
                })
            })
            .collect()
    }
}

/// One eligible respondent ready for fitting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Respondent {
    /// Sex
    pub sex: Sex,
    /// Age band
    pub age_band: AgeBand,
    /// Region, when region is modeled
    pub region: Option<Region>,
    /// Survey weight (frequency weight)
    pub weight: f64,
    /// Derived binary label
    pub label: bool,
}

impl CovariateLevels for Respondent {
    fn level(&self, covariate: Covariate) -> Option<&str> {
        match covariate {
            Covariate::Sex => Some(self.sex.as_str()),
            Covariate::AgeBand => Some(self.age_band.as_str()),
            Covariate::Region => self.region.map(|r| r.as_str()),
        }
    }
}
