//! Data model of the trait pipeline.

pub mod cell;
pub mod demographics;
pub mod output;
pub mod respondent;

pub use cell::{Cell, CellBackbone, Universe};
pub use demographics::{AgeBand, Covariate, CovariateLevels, Region, Sex};
pub use output::{Manifest, ManifestEntry, TraitMeta, TraitOutput};
pub use respondent::{Respondent, RespondentTable};
