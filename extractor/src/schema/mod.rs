//! Requested output schemas.
//!
//! A [`Schema`] is the ordered list of columns a caller wants extracted. It is
//! fixed for the whole of one extraction and shared by every row produced.
//!
//! # Schema Files
//!
//! Schemas can be loaded from a JSON array of column definitions:
//!
//! ```json
//! [
//!   { "name": "app_id", "type": "string" },
//!   { "name": "collector_tstamp", "type": "datetime?" },
//!   { "name": "tr_total", "type": "double?", "default": 0.0 },
//!   { "name": "contexts_com_acme_product_1", "type": "string" }
//! ]
//! ```
//!
//! `default` is optional. Nullable columns then default to null and
//! non-nullable value columns to the zero value of their kind.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{SchemaFileError, SchemaFileResult};
use crate::models::{ColumnType, FieldValue};
use crate::transform::coerce;

/// One requested output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub default: FieldValue,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType, default: FieldValue) -> Self {
        Self {
            name: name.into(),
            column_type,
            default,
        }
    }

    /// Column whose default is implied by its type.
    pub fn with_implicit_default(name: impl Into<String>, column_type: ColumnType) -> Self {
        let default = column_type.implicit_default();
        Self::new(name, column_type, default)
    }
}

/// Ordered set of requested columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the first column with this name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Parse a schema from its JSON file representation.
    pub fn from_json(json: &str) -> SchemaFileResult<Self> {
        let raw: Vec<RawColumn> = serde_json::from_str(json)?;
        if raw.is_empty() {
            return Err(SchemaFileError::Empty);
        }

        let columns = raw
            .into_iter()
            .map(RawColumn::into_spec)
            .collect::<SchemaFileResult<Vec<_>>>()?;

        Ok(Self::new(columns))
    }

    /// Load a schema file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> SchemaFileResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}

impl FromIterator<ColumnSpec> for Schema {
    fn from_iter<I: IntoIterator<Item = ColumnSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Column as written in a schema file, before type and default resolution.
#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    default: Option<Value>,
}

impl RawColumn {
    fn into_spec(self) -> SchemaFileResult<ColumnSpec> {
        let column_type: ColumnType =
            self.column_type
                .parse()
                .map_err(|source| SchemaFileError::InvalidType {
                    column: self.name.clone(),
                    source,
                })?;

        let default = match self.default {
            None => column_type.implicit_default(),
            Some(Value::Null) => FieldValue::Null,
            Some(value) => coerce(&value, column_type.kind()).ok_or_else(|| {
                SchemaFileError::InvalidDefault {
                    column: self.name.clone(),
                    column_type: column_type.clone(),
                    value: value.to_string(),
                }
            })?,
        };

        Ok(ColumnSpec::new(self.name, column_type, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemanticType;

    #[test]
    fn test_from_json() {
        let schema = Schema::from_json(
            r#"[
                { "name": "app_id", "type": "string" },
                { "name": "tr_total", "type": "double?", "default": 0.0 },
                { "name": "txn_id", "type": "int32" }
            ]"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("tr_total"), Some(1));

        let columns = schema.columns();
        assert_eq!(columns[0].default, FieldValue::Null);
        assert_eq!(columns[1].column_type, ColumnType::nullable(SemanticType::Double));
        assert_eq!(columns[1].default, FieldValue::Double(0.0));
        assert_eq!(columns[2].default, FieldValue::Int32(0));
    }

    #[test]
    fn test_default_is_coerced_to_column_kind() {
        let schema = Schema::from_json(
            r#"[{ "name": "collector_tstamp", "type": "datetime?", "default": "2017-01-01T00:00:00Z" }]"#,
        )
        .unwrap();
        assert!(schema.columns()[0].default.as_datetime().is_some());
    }

    #[test]
    fn test_invalid_default() {
        let err = Schema::from_json(r#"[{ "name": "txn_id", "type": "int32?", "default": "abc" }]"#)
            .unwrap_err();
        assert!(matches!(err, SchemaFileError::InvalidDefault { .. }));
        assert!(err.to_string().contains("txn_id"));
    }

    #[test]
    fn test_invalid_type() {
        let err = Schema::from_json(r#"[{ "name": "txn_id", "type": "decimal" }]"#).unwrap_err();
        assert!(matches!(err, SchemaFileError::InvalidType { .. }));
    }

    #[test]
    fn test_empty_schema() {
        assert!(matches!(Schema::from_json("[]"), Err(SchemaFileError::Empty)));
    }
}
