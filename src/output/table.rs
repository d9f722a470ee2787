//! Record → Arrow table conversion
//!
//! Turns a sequence of records into a `RecordBatch`. Column types are
//! inferred per column across all rows; nested objects and arrays are kept
//! as JSON text.

use crate::error::{Error, Result};
use crate::types::Record;
use crate::visits::VisitSummary;
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, NullArray, StringArray,
    UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Which fields become columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// Fields of the first record only, in its order; extra fields in later
    /// records are dropped and missing ones are null
    #[default]
    FirstRecord,
    /// First record's fields, then fields first seen in later records
    Union,
}

/// Column names for `records` under `policy`
pub fn columns_for(records: &[Record], policy: ColumnPolicy) -> Vec<String> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let mut columns: Vec<String> = first.keys().cloned().collect();

    if policy == ColumnPolicy::Union {
        for record in &records[1..] {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    columns
}

/// Convert records to an Arrow RecordBatch
///
/// An empty slice yields an empty batch with no columns.
pub fn records_to_batch(records: &[Record], policy: ColumnPolicy) -> Result<RecordBatch> {
    let columns = columns_for(records, policy);
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for name in &columns {
        let values: Vec<Option<&Value>> = records.iter().map(|r| r.get(name)).collect();
        let data_type = values
            .iter()
            .flatten()
            .map(|v| infer_type(v))
            .fold(DataType::Null, |acc, t| merge_types(&acc, &t));

        arrays.push(build_array(&values, &data_type));
        fields.push(Field::new(name, data_type, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .map_err(|e| Error::output(format!("Failed to create RecordBatch: {e}")))
}

/// Convert visit summaries to a typed table
///
/// Columns: `id`, `visits_number`, `first_visit`, `last_visit` (dates).
pub fn summaries_to_batch(summaries: &[VisitSummary]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("id", DataType::UInt64, false),
        Field::new("visits_number", DataType::UInt64, false),
        Field::new("first_visit", DataType::Date32, true),
        Field::new("last_visit", DataType::Date32, true),
    ]);

    let ids: UInt64Array = summaries.iter().map(|s| Some(s.id)).collect();
    let counts: UInt64Array = summaries
        .iter()
        .map(|s| Some(s.visits_number as u64))
        .collect();
    let firsts: Date32Array = summaries
        .iter()
        .map(|s| s.first_visit.map(days_since_epoch))
        .collect();
    let lasts: Date32Array = summaries
        .iter()
        .map(|s| s.last_visit.map(days_since_epoch))
        .collect();

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(ids),
        Arc::new(counts),
        Arc::new(firsts),
        Arc::new(lasts),
    ];
    RecordBatch::try_new(Arc::new(schema), arrays)
        .map_err(|e| Error::output(format!("Failed to create RecordBatch: {e}")))
}

/// Render a batch as a text table
pub fn pretty_table(batch: &RecordBatch) -> Result<String> {
    Ok(pretty_format_batches(std::slice::from_ref(batch))?.to_string())
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    date.signed_duration_since(epoch).num_days() as i32
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) | Value::Array(_) | Value::Object(_) => DataType::Utf8,
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Null => Arc::new(NullArray::new(values.len())),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Arc::new(arr)
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Arc::new(arr)
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Arc::new(arr)
        }

        _ => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.and_then(|v| match v {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                })
                .collect();
            Arc::new(arr)
        }
    }
}
