//! Schema handling for heterogeneous survey extracts
//!
//! Resolves survey-specific column aliases to canonical fields and joins
//! related extracts into one respondent-level table.

pub mod merge;
pub mod resolver;

pub use merge::{column_names, merge_extracts};
pub use resolver::{
    CanonicalColumns, ColumnIndex, KNOWN_RESPONDENT_IDS, detect_shared_key, resolve,
    resolve_optional,
};
