//! Merging related extracts on their shared respondent identifier.
//!
//! Time-use data ships respondent demographics and activity summaries as
//! separate files; both must be joined before any trait can be derived.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::schema::resolver::detect_shared_key;
use crate::utils::arrow::key_values;

/// Column names of a batch, in schema order
#[must_use]
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Inner-join two extracts on their shared respondent id
///
/// Left-row order is preserved; a left row matching several right rows is
/// repeated once per match. Right-hand columns whose names collide with a
/// left column get `suffix` appended; the right key column is dropped.
/// Rows with a missing key never match.
pub fn merge_extracts(left: &RecordBatch, right: &RecordBatch, suffix: &str) -> Result<RecordBatch> {
    let key = detect_shared_key(&column_names(left), &column_names(right))?;
    info!("Merging extracts on respondent id column {key}");

    let left_keys = key_values(left, &key)?;
    let right_keys = key_values(right, &key)?;

    let mut right_rows: FxHashMap<&str, Vec<u32>> = FxHashMap::default();
    for (row, value) in right_keys.iter().enumerate() {
        if let Some(value) = value {
            right_rows.entry(value.as_str()).or_default().push(row as u32);
        }
    }

    let mut left_take = Vec::new();
    let mut right_take = Vec::new();
    for (row, value) in left_keys.iter().enumerate() {
        let Some(matches) = value.as_deref().and_then(|v| right_rows.get(v)) else {
            continue;
        };
        for &right_row in matches {
            left_take.push(row as u32);
            right_take.push(right_row);
        }
    }
    let left_take = UInt32Array::from(left_take);
    let right_take = UInt32Array::from(right_take);

    let left_schema = left.schema();
    let left_names: HashSet<&str> = left_schema.fields().iter().map(|f| f.name().as_str()).collect();

    let mut fields: Vec<Arc<Field>> = Vec::with_capacity(left.num_columns() + right.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (field, column) in left_schema.fields().iter().zip(left.columns()) {
        fields.push(Arc::new(field.as_ref().clone().with_nullable(true)));
        columns.push(take(column.as_ref(), &left_take, None)?);
    }

    let right_schema = right.schema();
    for (field, column) in right_schema.fields().iter().zip(right.columns()) {
        if field.name() == &key {
            continue;
        }
        let name = if left_names.contains(field.name().as_str()) {
            format!("{}{suffix}", field.name())
        } else {
            field.name().clone()
        };
        fields.push(Arc::new(Field::new(name, field.data_type().clone(), true)));
        columns.push(take(column.as_ref(), &right_take, None)?);
    }

    let merged = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    info!(
        "Merged {} x {} rows into {} rows",
        left.num_rows(),
        right.num_rows(),
        merged.num_rows()
    );
    Ok(merged)
}
