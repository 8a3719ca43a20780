//! Test utilities
//!
//! Synthetic fixtures and helpers shared by unit and integration tests.

pub mod helpers;

pub use fixtures::{
    backbone, batch_from_columns, health_survey_batch, health_traits, time_use_batches,
    time_use_traits,
};
pub use helpers::{temp_dir, write_run_fixture};
