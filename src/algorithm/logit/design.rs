//! Dummy-coded design matrices.
//!
//! Each categorical covariate contributes one indicator column per level
//! observed in the training rows, except the alphabetically first level,
//! which is the reference. An intercept column named `const` comes first.
//! Column names follow `<covariate>_<level>`.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2};
use smallvec::SmallVec;

use crate::error::{Result, TraitModelError};
use crate::models::{Covariate, CovariateLevels};

/// Name of the intercept column
pub const INTERCEPT: &str = "const";

/// Meaning of one design column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignTerm {
    Intercept,
    Indicator { covariate: Covariate, level: String },
}

impl DesignTerm {
    /// Column name of the term
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Intercept => INTERCEPT.to_string(),
            Self::Indicator { covariate, level } => format!("{}_{level}", covariate.name()),
        }
    }

    fn value<T: CovariateLevels + ?Sized>(&self, item: &T) -> f64 {
        match self {
            Self::Intercept => 1.0,
            Self::Indicator { covariate, level } => {
                if item.level(*covariate) == Some(level.as_str()) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// The ordered columns of a fitted design
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignColumns {
    /// Covariates in the order they were encoded
    pub covariates: SmallVec<[Covariate; 3]>,
    /// Columns, intercept first
    pub terms: Vec<DesignTerm>,
}

impl DesignColumns {
    /// Learn the columns from training rows
    ///
    /// # Errors
    /// `FitError` when a row has no level for one of the covariates.
    pub fn learn<T: CovariateLevels>(rows: &[T], covariates: &[Covariate]) -> Result<Self> {
        let mut terms = vec![DesignTerm::Intercept];
        for &covariate in covariates {
            let mut levels = BTreeSet::new();
            for row in rows {
                let level = row.level(covariate).ok_or_else(|| {
                    TraitModelError::fit(format!("training row without a {covariate} level"))
                })?;
                levels.insert(level);
            }
            terms.extend(levels.into_iter().skip(1).map(|level| DesignTerm::Indicator {
                covariate,
                level: level.to_string(),
            }));
        }
        Ok(Self {
            covariates: SmallVec::from_slice(covariates),
            terms,
        })
    }

    /// Column names, intercept first
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.terms.iter().map(DesignTerm::name).collect()
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Encode one item against these columns.
    ///
    /// Levels without a column (the reference level, or a level the
    /// training rows never showed) encode as all zeros. Covariates outside
    /// the design are ignored.
    #[must_use]
    pub fn encode_row<T: CovariateLevels + ?Sized>(&self, item: &T) -> Array1<f64> {
        self.terms.iter().map(|term| term.value(item)).collect()
    }

    /// Encode many items into an `n x p` matrix
    #[must_use]
    pub fn encode<T: CovariateLevels>(&self, items: &[T]) -> Array2<f64> {
        let mut values = Array2::zeros((items.len(), self.terms.len()));
        for (mut row, item) in values.rows_mut().into_iter().zip(items) {
            for (cell, term) in row.iter_mut().zip(&self.terms) {
                *cell = term.value(item);
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeBand, Region, Respondent, Sex};

    fn respondent(sex: Sex, age_band: AgeBand, region: Option<Region>) -> Respondent {
        Respondent {
            sex,
            age_band,
            region,
            weight: 1.0,
            label: false,
        }
    }

    #[test]
    fn test_drop_first_level_per_covariate() {
        let rows = vec![
            respondent(Sex::Male, AgeBand::Age25To34, Some(Region::West)),
            respondent(Sex::Female, AgeBand::Age65Plus, Some(Region::Midwest)),
            respondent(Sex::Male, AgeBand::Age18To24, Some(Region::South)),
        ];
        let design =
            DesignColumns::learn(&rows, &[Covariate::Sex, Covariate::AgeBand, Covariate::Region])
                .unwrap();
        assert_eq!(
            design.names(),
            vec![
                "const",
                "sex_male",
                "age_band_25_34",
                "age_band_65_plus",
                "region_south",
                "region_west",
            ]
        );

        let x = design.encode(&rows);
        assert_eq!(x.dim(), (3, 6));
        assert_eq!(x.row(0).to_vec(), vec![1.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(x.row(1).to_vec(), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_level_covariate_contributes_no_column() {
        let rows = vec![
            respondent(Sex::Female, AgeBand::Age25To34, None),
            respondent(Sex::Female, AgeBand::Age35To44, None),
        ];
        let design = DesignColumns::learn(&rows, &[Covariate::Sex, Covariate::AgeBand]).unwrap();
        assert_eq!(design.names(), vec!["const", "age_band_35_44"]);
    }

    #[test]
    fn test_unseen_level_encodes_as_reference() {
        let rows = vec![
            respondent(Sex::Female, AgeBand::Age25To34, None),
            respondent(Sex::Male, AgeBand::Age35To44, None),
        ];
        let design = DesignColumns::learn(&rows, &[Covariate::Sex, Covariate::AgeBand]).unwrap();
        let unseen = respondent(Sex::Male, AgeBand::Age65Plus, Some(Region::West));
        assert_eq!(design.encode_row(&unseen).to_vec(), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_level_is_a_fit_error() {
        let rows = vec![respondent(Sex::Female, AgeBand::Age25To34, None)];
        let err = DesignColumns::learn(&rows, &[Covariate::Region]).unwrap_err();
        assert!(err.is_fit_error());
    }
}
