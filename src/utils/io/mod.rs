//! I/O utilities for extracts and artifacts

pub mod output;
pub mod parquet;

pub use output::{read_trait_output, write_manifest, write_trait_output};
pub use self::parquet::{read_extract, read_extracts_async, write_extract};
