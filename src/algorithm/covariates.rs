//! Covariate normalization
//!
//! Converts raw coded survey values into canonical categorical covariates.
//! Every function here is total: missing, non-integral or out-of-range
//! input maps to `None`, which later excludes the row from fitting.

use arrow::record_batch::RecordBatch;
use log::info;

use crate::config::{AgeCoding, RegionCoding, TraitConfig};
use crate::error::Result;
use crate::models::{AgeBand, Region, RespondentTable, Sex};
use crate::schema::CanonicalColumns;
use crate::utils::arrow::numeric_values;

/// Interpret a raw value as an integral survey code
#[must_use]
pub fn as_code(value: Option<f64>) -> Option<i64> {
    let value = value?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Age band for an age in completed years; ages under `min_age` are ineligible
#[must_use]
pub fn age_band_from_years(age: Option<f64>, min_age: u32) -> Option<AgeBand> {
    let age = age?;
    if !age.is_finite() || age < 0.0 {
        return None;
    }
    let years = age.floor() as u32;
    if years < min_age {
        return None;
    }
    AgeBand::from_years(years)
}

/// Age band for a five-year age-group code (1 = 18-24 ... 13 = 80+)
///
/// Codes outside 1-13 (including the "don't know / refused" code 14) are
/// unknown. Bands ending below `min_age` are ineligible; a band straddling
/// it is kept since the exact age is not recorded.
#[must_use]
pub fn age_band_from_group_code(code: Option<f64>, min_age: u32) -> Option<AgeBand> {
    let band = match as_code(code)? {
        1 => AgeBand::Age18To24,
        2 | 3 => AgeBand::Age25To34,
        4 | 5 => AgeBand::Age35To44,
        6 | 7 => AgeBand::Age45To54,
        8 | 9 => AgeBand::Age55To64,
        10..=13 => AgeBand::Age65Plus,
        _ => return None,
    };
    band.reaches(min_age).then_some(band)
}

/// Sex for a sex code: 1 = male, 2 = female, anything else unknown
#[must_use]
pub fn sex_from_code(code: Option<f64>) -> Option<Sex> {
    match as_code(code)? {
        1 => Some(Sex::Male),
        2 => Some(Sex::Female),
        _ => None,
    }
}

/// Region for a census region code 1-4
#[must_use]
pub fn region_from_census_code(code: Option<f64>) -> Option<Region> {
    match as_code(code)? {
        1 => Some(Region::Northeast),
        2 => Some(Region::Midwest),
        3 => Some(Region::South),
        4 => Some(Region::West),
        _ => None,
    }
}

/// Region for a state FIPS code; territories and unknown codes map to `None`
#[must_use]
pub fn region_from_state_fips(code: Option<f64>) -> Option<Region> {
    match as_code(code)? {
        9 | 23 | 25 | 33 | 34 | 36 | 42 | 44 | 50 => Some(Region::Northeast),
        17 | 18 | 19 | 20 | 26 | 27 | 29 | 31 | 38 | 39 | 46 | 55 => Some(Region::Midwest),
        1 | 5 | 10 | 11 | 12 | 13 | 21 | 22 | 24 | 28 | 37 | 40 | 45 | 47 | 48 | 51 | 54 => {
            Some(Region::South)
        }
        2 | 4 | 6 | 8 | 15 | 16 | 30 | 32 | 35 | 41 | 49 | 53 | 56 => Some(Region::West),
        _ => None,
    }
}

/// Normalize the canonical columns of an extract into a respondent table
///
/// When `columns.region` is `None` every row's region is `None`.
pub fn normalize(
    batch: &RecordBatch,
    columns: &CanonicalColumns,
    trait_cfg: &TraitConfig,
) -> Result<RespondentTable> {
    let min_age = trait_cfg.min_age;

    let weight = numeric_values(batch, &columns.weight)?
        .into_iter()
        .map(|w| w.filter(|w| w.is_finite()))
        .collect();

    let sex = numeric_values(batch, &columns.sex)?
        .into_iter()
        .map(sex_from_code)
        .collect();

    let ages = numeric_values(batch, &columns.age)?;
    let age_band = match trait_cfg.age_coding {
        AgeCoding::Years => ages
            .into_iter()
            .map(|a| age_band_from_years(a, min_age))
            .collect(),
        AgeCoding::FiveYearGroup => ages
            .into_iter()
            .map(|a| age_band_from_group_code(a, min_age))
            .collect(),
    };

    let region = match &columns.region {
        Some(region_col) => {
            let codes = numeric_values(batch, region_col)?;
            match trait_cfg.region_coding {
                RegionCoding::CensusRegion => {
                    codes.into_iter().map(region_from_census_code).collect()
                }
                RegionCoding::StateFips => codes.into_iter().map(region_from_state_fips).collect(),
            }
        }
        None => vec![None; batch.num_rows()],
    };

    let table = RespondentTable {
        sex,
        age_band,
        region,
        weight,
    };
    info!(
        "Normalized {} respondents for {} ({} with region)",
        table.len(),
        trait_cfg.key,
        table.region_coverage()
    );
    Ok(table)
}
