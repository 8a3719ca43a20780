//! Parquet extract operations
//!
//! Survey extracts are exchanged as Parquet files. Each file is read whole
//! into a single Arrow record batch, since every pipeline step needs all
//! respondents at once.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use futures::future::try_join_all;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{Result, TraitModelError};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> usize {
    std::env::var("PARQUET_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Read a Parquet extract into one record batch
///
/// # Arguments
/// * `path` - Path to the Parquet file
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid Parquet
pub fn read_extract(path: &Path) -> Result<RecordBatch> {
    let start = std::time::Instant::now();
    log_operation_start("Reading survey extract", path);

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.with_batch_size(get_batch_size()).build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    log_operation_complete("read", path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Read several extracts concurrently, preserving their order
pub async fn read_extracts_async(paths: &[PathBuf]) -> Result<Vec<RecordBatch>> {
    let tasks = paths.iter().cloned().map(|path| async move {
        tokio::task::spawn_blocking(move || read_extract(&path))
            .await
            .map_err(|e| TraitModelError::IoError(std::io::Error::other(e)))?
    });
    try_join_all(tasks).await
}

/// Write a record batch as a Parquet extract
pub fn write_extract(path: &Path, batch: &RecordBatch) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
