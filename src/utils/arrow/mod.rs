//! Arrow utilities
//!
//! Typed access to columns of raw survey extracts.

pub mod extractors;

pub use extractors::{key_values, numeric_values};
