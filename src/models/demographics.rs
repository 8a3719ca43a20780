//! Canonical demographic categories shared by respondents and cells.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical sex category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Male
    Male,
    /// Female
    Female,
}

impl Sex {
    /// Canonical label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Canonical adult age band (half-open ranges of completed years)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBand {
    /// 18-24
    #[serde(rename = "18_24")]
    Age18To24,
    /// 25-34
    #[serde(rename = "25_34")]
    Age25To34,
    /// 35-44
    #[serde(rename = "35_44")]
    Age35To44,
    /// 45-54
    #[serde(rename = "45_54")]
    Age45To54,
    /// 55-64
    #[serde(rename = "55_64")]
    Age55To64,
    /// 65 and over
    #[serde(rename = "65_plus")]
    Age65Plus,
}

impl AgeBand {
    /// All bands in ascending order
    pub const ALL: [Self; 6] = [
        Self::Age18To24,
        Self::Age25To34,
        Self::Age35To44,
        Self::Age45To54,
        Self::Age55To64,
        Self::Age65Plus,
    ];

    /// Canonical label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Age18To24 => "18_24",
            Self::Age25To34 => "25_34",
            Self::Age35To44 => "35_44",
            Self::Age45To54 => "45_54",
            Self::Age55To64 => "55_64",
            Self::Age65Plus => "65_plus",
        }
    }

    /// First age (inclusive) covered by the band
    #[must_use]
    pub const fn lower_bound(&self) -> u32 {
        match self {
            Self::Age18To24 => 18,
            Self::Age25To34 => 25,
            Self::Age35To44 => 35,
            Self::Age45To54 => 45,
            Self::Age55To64 => 55,
            Self::Age65Plus => 65,
        }
    }

    /// Last age (inclusive) covered by the band; `None` when open-ended
    #[must_use]
    pub const fn upper_bound(&self) -> Option<u32> {
        match self {
            Self::Age18To24 => Some(24),
            Self::Age25To34 => Some(34),
            Self::Age35To44 => Some(44),
            Self::Age45To54 => Some(54),
            Self::Age55To64 => Some(64),
            Self::Age65Plus => None,
        }
    }

    /// Whether any age in the band reaches `min_age`
    #[must_use]
    pub fn reaches(&self, min_age: u32) -> bool {
        self.upper_bound().is_none_or(|upper| upper >= min_age)
    }

    /// Band containing an age in completed years; `None` below 18
    #[must_use]
    pub const fn from_years(age: u32) -> Option<Self> {
        match age {
            0..18 => None,
            18..25 => Some(Self::Age18To24),
            25..35 => Some(Self::Age25To34),
            35..45 => Some(Self::Age35To44),
            45..55 => Some(Self::Age45To54),
            55..65 => Some(Self::Age55To64),
            _ => Some(Self::Age65Plus),
        }
    }
}

impl FromStr for AgeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|band| band.as_str() == s)
            .ok_or_else(|| format!("unknown age band '{s}'"))
    }
}

/// First age covered by any age-band label, including child bands
/// such as `0_17` or `15_17` that appear only in the cell backbone.
#[must_use]
pub fn age_band_lower_bound(label: &str) -> Option<u32> {
    label.split('_').next()?.parse().ok()
}

/// Last age covered by an age-band label; open-ended labels such as
/// `65_plus` reach `u32::MAX`.
#[must_use]
pub fn age_band_upper_bound(label: &str) -> Option<u32> {
    let (_, upper) = label.split_once('_')?;
    if upper == "plus" {
        Some(u32::MAX)
    } else {
        upper.parse().ok()
    }
}

/// Census region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Northeast (code 1)
    Northeast,
    /// Midwest (code 2)
    Midwest,
    /// South (code 3)
    South,
    /// West (code 4)
    West,
}

impl Region {
    /// Canonical label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Northeast => "northeast",
            Self::Midwest => "midwest",
            Self::South => "south",
            Self::West => "west",
        }
    }
}

/// A categorical regression covariate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Covariate {
    /// Sex
    Sex,
    /// Age band
    AgeBand,
    /// Census region
    Region,
}

impl Covariate {
    /// Column prefix used in the design matrix
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sex => "sex",
            Self::AgeBand => "age_band",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for Covariate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that carries a categorical level per covariate
pub trait CovariateLevels {
    /// Level of `covariate`, or `None` when unknown
    fn level(&self, covariate: Covariate) -> Option<&str>;
}
