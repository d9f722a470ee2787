//! Tests for output module

use super::*;
use crate::types::Record;
use crate::visits::VisitSummary;
use arrow::array::{Array, Date32Array, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn records(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .map(|v| match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        })
        .collect()
}

fn heterogeneous() -> Vec<Record> {
    records(vec![
        json!({"id": 1, "name": "Alice", "visits": 3}),
        json!({"id": 2, "name": "Bob", "visits": 0, "email": "bob@example.com"}),
        json!({"name": "Carol", "id": 3}),
    ])
}

#[test]
fn test_columns_first_record() {
    let cols = columns_for(&heterogeneous(), ColumnPolicy::FirstRecord);
    assert_eq!(cols, vec!["id", "name", "visits"]);
}

#[test]
fn test_columns_union() {
    let cols = columns_for(&heterogeneous(), ColumnPolicy::Union);
    assert_eq!(cols, vec!["id", "name", "visits", "email"]);
}

#[test]
fn test_empty_records() {
    let batch = records_to_batch(&[], ColumnPolicy::Union).unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.num_columns(), 0);
}

#[test]
fn test_first_record_policy_batch() {
    let batch = records_to_batch(&heterogeneous(), ColumnPolicy::FirstRecord).unwrap();

    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.num_columns(), 3);
    let schema = batch.schema();
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(1).data_type(), &DataType::Utf8);

    let visits = batch
        .column(2)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(visits.value(0), 3);
    assert!(visits.is_null(2));
}

#[test]
fn test_union_policy_batch() {
    let batch = records_to_batch(&heterogeneous(), ColumnPolicy::Union).unwrap();

    assert_eq!(batch.num_columns(), 4);
    let email = batch
        .column(3)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert!(email.is_null(0));
    assert_eq!(email.value(1), "bob@example.com");
}

#[test]
fn test_mixed_numbers_become_float() {
    let batch = records_to_batch(
        &records(vec![json!({"spent": 10}), json!({"spent": 2.5})]),
        ColumnPolicy::FirstRecord,
    )
    .unwrap();

    let spent = batch
        .column(0)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(spent.value(0), 10.0);
    assert_eq!(spent.value(1), 2.5);
}

#[test]
fn test_nested_values_become_json_text() {
    let batch = records_to_batch(
        &records(vec![json!({"staff": {"id": 5}, "services": [1, 2]})]),
        ColumnPolicy::FirstRecord,
    )
    .unwrap();

    let staff = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(staff.value(0), r#"{"id":5}"#);
    let services = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(services.value(0), "[1,2]");
}

#[test]
fn test_conflicting_types_fall_back_to_string() {
    let batch = records_to_batch(
        &records(vec![json!({"card": 123}), json!({"card": "A-1"})]),
        ColumnPolicy::FirstRecord,
    )
    .unwrap();

    let card = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(card.value(0), "123");
    assert_eq!(card.value(1), "A-1");
}

#[test]
fn test_all_null_column() {
    let batch = records_to_batch(
        &records(vec![json!({"comment": null}), json!({"comment": null})]),
        ColumnPolicy::FirstRecord,
    )
    .unwrap();
    assert_eq!(batch.schema().field(0).data_type(), &DataType::Null);
    assert_eq!(batch.num_rows(), 2);
}

#[test]
fn test_summaries_to_batch() {
    let summaries = vec![
        VisitSummary {
            id: 10,
            visits_number: 2,
            first_visit: NaiveDate::from_ymd_opt(1970, 1, 2),
            last_visit: NaiveDate::from_ymd_opt(1970, 1, 11),
        },
        VisitSummary::empty(11),
    ];

    let batch = summaries_to_batch(&summaries).unwrap();

    assert_eq!(batch.num_rows(), 2);
    let ids = batch
        .column(0)
        .as_any()
        .downcast_ref::<UInt64Array>()
        .unwrap();
    assert_eq!(ids.values().to_vec(), vec![10, 11]);

    let first = batch
        .column(2)
        .as_any()
        .downcast_ref::<Date32Array>()
        .unwrap();
    assert_eq!(first.value(0), 1);
    assert!(first.is_null(1));

    let last = batch
        .column(3)
        .as_any()
        .downcast_ref::<Date32Array>()
        .unwrap();
    assert_eq!(last.value(0), 10);
}

#[test]
fn test_pretty_table() {
    let batch = records_to_batch(
        &records(vec![json!({"id": 1, "name": "Alice"})]),
        ColumnPolicy::FirstRecord,
    )
    .unwrap();

    let text = pretty_table(&batch).unwrap();
    assert!(text.contains("| id | name  |"));
    assert!(text.contains("Alice"));
}
