//! Column extraction utilities for Arrow record batches
//!
//! Survey extracts arrive with whatever physical types the exporter chose
//! (integer codes, doubles, numeric strings). These helpers cast a column to
//! a single working type and surface missing values as `None`.

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{Result, TraitModelError};

/// Get a column by its exact name
fn column(batch: &RecordBatch, column_name: &str) -> Result<ArrayRef> {
    let idx = batch.schema().index_of(column_name)?;
    Ok(batch.column(idx).clone())
}

/// Extract a column as `f64` values
///
/// Casting is "safe": values that cannot be converted become null. Integer, floating point and string columns are all accepted; strings
/// that do not parse, nulls and NaN all become `None`.
///
/// # Errors
///
/// Returns an error if the column does not exist or cannot be cast to
/// `Float64` at all (e.g. a nested type).
pub fn numeric_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<f64>>> {
    let array = column(batch, column_name)?;
    let array = cast(&array, &DataType::Float64)?;
    let floats = array
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            TraitModelError::ConversionError(format!(
                "column '{column_name}' could not be read as Float64"
            ))
        })?;

    Ok((0..floats.len())
        .map(|i| {
            if floats.is_null(i) {
                None
            } else {
                Some(floats.value(i)).filter(|v| !v.is_nan())
            }
        })
        .collect())
}

/// Extract a column as string keys, for joining extracts
///
/// Whole-number floats are rendered without a fractional part so that an
/// id stored as `20240101.0` in one file matches `20240101` in another.
pub fn key_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let array = column(batch, column_name)?;
    if matches!(array.data_type(), DataType::Float32 | DataType::Float64) {
        return Ok(numeric_values(batch, column_name)?
            .into_iter()
            .map(|v| {
                v.map(|f| {
                    if f.fract() == 0.0 && f.abs() < 9.0e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            })
            .collect());
    }

    let array = cast(&array, &DataType::Utf8)?;
    let strings = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            TraitModelError::ConversionError(format!(
                "column '{column_name}' could not be read as Utf8"
            ))
        })?;

    Ok((0..strings.len())
        .map(|i| {
            if strings.is_null(i) {
                None
            } else {
                Some(strings.value(i).trim().to_string()).filter(|s| !s.is_empty())
            }
        })
        .collect())
}
