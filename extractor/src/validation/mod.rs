//! Schema validation against the field type catalog.
//!
//! A requested schema is checked column by column before any line is
//! extracted. Validation never stops at the first problem: every violating
//! column is reported so the caller can fix the whole schema in one pass.
//!
//! # Rules
//!
//! - Catalog field: the declared type must be exactly the nullable form of
//!   the catalog type. There is no widening (`int32?` does not satisfy a
//!   `double?` field) and non-nullable value types are rejected.
//! - `contexts*` / `unstruct*` field not in the catalog: must be `string`.
//! - Anything else is an unrecognized column.
//!
//! # Example
//!
//! ```rust,ignore
//! use snowplow_extractor::{validate_schema, ColumnSpec, ColumnType, Schema, SemanticType};
//!
//! let schema = Schema::new(vec![ColumnSpec::with_implicit_default(
//!     "pp_xoffset_min",
//!     ColumnType::nullable(SemanticType::String),
//! )]);
//!
//! let violations = validate_schema(&schema).unwrap_err();
//! assert_eq!(violations.len(), 1);
//! ```

use crate::catalog;
use crate::error::SchemaViolation;
use crate::schema::{ColumnSpec, Schema};

/// Validate a schema against the catalog.
///
/// # Returns
/// * `Ok(())` if every column conforms
/// * `Err(violations)` with one entry per offending column, in schema order
pub fn validate_schema(schema: &Schema) -> Result<(), Vec<SchemaViolation>> {
    let violations = schema_violations(schema);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Quick check: true when the schema has no violations.
pub fn is_valid_schema(schema: &Schema) -> bool {
    schema.columns().iter().all(|c| check_column(c).is_none())
}

/// Every violation in the schema, in column order.
pub fn schema_violations(schema: &Schema) -> Vec<SchemaViolation> {
    schema.columns().iter().filter_map(check_column).collect()
}

/// Check a single column.
pub fn check_column(column: &ColumnSpec) -> Option<SchemaViolation> {
    let expected = match catalog::expected_column_type(&column.name) {
        Some(expected) => expected,
        None => {
            return Some(SchemaViolation::UnrecognizedColumn {
                column: column.name.clone(),
            })
        }
    };

    if column.column_type == expected {
        None
    } else {
        Some(SchemaViolation::TypeMismatch {
            column: column.name.clone(),
            actual: column.column_type.clone(),
            expected,
        })
    }
}
