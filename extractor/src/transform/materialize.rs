//! Canonical record to typed row.
//!
//! The requested schema drives materialization: every schema column is set,
//! whatever the record contains. Record fields outside the schema are
//! ignored, and a missing, null or unconvertible value silently falls back to
//! the column default.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::coerce::coerce;
use crate::models::{FieldValue, Row, RowBuffer};
use crate::schema::{ColumnSpec, Schema};

/// One transformed line: canonical field name to raw JSON value.
pub type CanonicalRecord = Map<String, Value>;

/// Fill `buffer` from `record`, one value per schema column.
///
/// The buffer is reset first, so it can be reused from line to line.
pub fn fill_row(record: &CanonicalRecord, buffer: &mut RowBuffer) {
    buffer.reset();

    let schema = Arc::clone(buffer.schema());
    for (index, column) in schema.columns().iter().enumerate() {
        buffer.set(index, column_value(record, column));
    }
}

/// Materialize a record into a new row.
pub fn materialize(record: &CanonicalRecord, schema: Arc<Schema>) -> Row {
    let mut buffer = RowBuffer::new(schema);
    fill_row(record, &mut buffer);
    buffer.freeze()
}

/// Coerced record value for `column`, or the column default.
pub fn column_value(record: &CanonicalRecord, column: &ColumnSpec) -> FieldValue {
    record
        .get(&column.name)
        .and_then(|value| coerce(value, column.column_type.kind()))
        .unwrap_or_else(|| column.default.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnType, SemanticType};
    use serde_json::json;

    fn record(value: Value) -> CanonicalRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn column(name: &str, kind: SemanticType, default: FieldValue) -> ColumnSpec {
        ColumnSpec::new(name, ColumnType::nullable(kind), default)
    }

    #[test]
    fn test_present_value_is_coerced() {
        let schema = Arc::new(Schema::new(vec![column("app_id", SemanticType::String, FieldValue::Null)]));
        let row = materialize(&record(json!({ "app_id": "shop" })), schema);

        assert_eq!(row.get("app_id"), Some(&FieldValue::String("shop".into())));
    }

    #[test]
    fn test_missing_value_uses_default() {
        let schema = Arc::new(Schema::new(vec![column("tr_total", SemanticType::Double, FieldValue::Double(0.0))]));
        let row = materialize(&record(json!({ "app_id": "shop" })), schema);

        assert_eq!(row.values(), &[FieldValue::Double(0.0)]);
    }

    #[test]
    fn test_null_and_unconvertible_use_default() {
        let schema = Arc::new(Schema::new(vec![
            column("txn_id", SemanticType::Int32, FieldValue::Int32(-1)),
            column("br_cookies", SemanticType::Boolean, FieldValue::Boolean(false)),
        ]));
        let row = materialize(
            &record(json!({ "txn_id": "not a number", "br_cookies": null })),
            schema,
        );

        assert_eq!(row.get("txn_id"), Some(&FieldValue::Int32(-1)));
        assert_eq!(row.get("br_cookies"), Some(&FieldValue::Boolean(false)));
    }

    #[test]
    fn test_schema_drives_iteration() {
        let schema = Arc::new(Schema::new(vec![
            column("platform", SemanticType::String, FieldValue::Null),
            column("app_id", SemanticType::String, FieldValue::Null),
        ]));
        let row = materialize(
            &record(json!({ "app_id": "shop", "event": "page_view", "txn_id": 3 })),
            schema,
        );

        let names: Vec<_> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["platform", "app_id"]);
        assert_eq!(row.values(), &[FieldValue::Null, FieldValue::String("shop".into())]);
    }

    #[test]
    fn test_reused_buffer_carries_nothing_over() {
        let schema = Arc::new(Schema::new(vec![
            column("app_id", SemanticType::String, FieldValue::Null),
            column("txn_id", SemanticType::Int32, FieldValue::Null),
        ]));
        let mut buffer = RowBuffer::new(schema);

        fill_row(&record(json!({ "app_id": "shop", "txn_id": 1 })), &mut buffer);
        let first = buffer.freeze();

        fill_row(&record(json!({ "app_id": "blog" })), &mut buffer);
        let second = buffer.freeze();

        assert_eq!(first.get("txn_id"), Some(&FieldValue::Int32(1)));
        assert_eq!(second.get("txn_id"), Some(&FieldValue::Null));
        assert!(buffer.is_complete());
    }

    #[test]
    fn test_deterministic() {
        let schema = Arc::new(Schema::new(vec![
            column("app_id", SemanticType::String, FieldValue::Null),
            column("contexts_com_acme_product_1", SemanticType::String, FieldValue::Null),
        ]));
        let rec = record(json!({ "app_id": "shop", "contexts_com_acme_product_1": [{ "sku": "A1" }] }));

        let a = materialize(&rec, Arc::clone(&schema));
        let b = materialize(&rec, schema);
        assert_eq!(a, b);
        assert_eq!(
            a.get("contexts_com_acme_product_1").and_then(FieldValue::as_str),
            Some(r#"[{"sku":"A1"}]"#)
        );
    }
}
