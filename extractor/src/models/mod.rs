//! Domain models for the extraction pipeline.
//!
//! - [`SemanticType`] - Closed set of field types known to the catalog
//! - [`ColumnType`] - A declared output column type (semantic type + nullability)
//! - [`FieldValue`] - A typed cell value
//! - [`RowBuffer`] / [`Row`] - Mutable row buffer and its frozen snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TypeParseError;

pub mod row;

pub use row::{Row, RowBuffer};

// =============================================================================
// Semantic Type
// =============================================================================

/// Semantic type of a canonical event field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Boolean,
    Int32,
    Double,
    DateTime,
    String,
    /// Homogeneous array.
    ArrayOf(Box<SemanticType>),
    /// Map with string keys.
    MapOf(Box<SemanticType>),
}

impl SemanticType {
    /// Reference kinds have no non-nullable representation.
    pub fn is_reference(&self) -> bool {
        match self {
            SemanticType::String | SemanticType::ArrayOf(_) | SemanticType::MapOf(_) => true,
            SemanticType::Boolean
            | SemanticType::Int32
            | SemanticType::Double
            | SemanticType::DateTime => false,
        }
    }

    /// Value used when a non-nullable column has no explicit default.
    pub fn zero_value(&self) -> FieldValue {
        match self {
            SemanticType::Boolean => FieldValue::Boolean(false),
            SemanticType::Int32 => FieldValue::Int32(0),
            SemanticType::Double => FieldValue::Double(0.0),
            SemanticType::DateTime => FieldValue::DateTime(DateTime::<Utc>::default()),
            SemanticType::String | SemanticType::ArrayOf(_) | SemanticType::MapOf(_) => {
                FieldValue::Null
            }
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Boolean => write!(f, "boolean"),
            SemanticType::Int32 => write!(f, "int32"),
            SemanticType::Double => write!(f, "double"),
            SemanticType::DateTime => write!(f, "datetime"),
            SemanticType::String => write!(f, "string"),
            SemanticType::ArrayOf(inner) => write!(f, "array<{}>", inner),
            SemanticType::MapOf(inner) => write!(f, "map<string, {}>", inner),
        }
    }
}

impl FromStr for SemanticType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();

        if let Some(inner) = generic_argument(&lower, "array") {
            return Ok(SemanticType::ArrayOf(Box::new(inner.parse()?)));
        }

        if let Some(args) = generic_argument(&lower, "map") {
            let (key, value) = args
                .split_once(',')
                .ok_or_else(|| TypeParseError(trimmed.to_string()))?;
            if key.trim() != "string" {
                return Err(TypeParseError(trimmed.to_string()));
            }
            return Ok(SemanticType::MapOf(Box::new(value.parse()?)));
        }

        match lower.as_str() {
            "bool" | "boolean" => Ok(SemanticType::Boolean),
            "int" | "int32" => Ok(SemanticType::Int32),
            "double" | "float64" => Ok(SemanticType::Double),
            "datetime" | "timestamp" => Ok(SemanticType::DateTime),
            "string" => Ok(SemanticType::String),
            _ => Err(TypeParseError(trimmed.to_string())),
        }
    }
}

/// `array<int32>` with `name = "array"` gives `Some("int32")`.
fn generic_argument<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

// =============================================================================
// Column Type
// =============================================================================

/// Declared type of an output column.
///
/// Reference kinds are always nullable; value kinds carry an explicit flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnType {
    kind: SemanticType,
    nullable: bool,
}

impl ColumnType {
    /// Nullable column of the given kind (`int32?`, `string`).
    pub fn nullable(kind: SemanticType) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Non-nullable column of the given kind. Reference kinds stay nullable.
    pub fn required(kind: SemanticType) -> Self {
        let nullable = kind.is_reference();
        Self { kind, nullable }
    }

    pub fn kind(&self) -> &SemanticType {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Default for a column declared without one.
    pub fn implicit_default(&self) -> FieldValue {
        if self.nullable {
            FieldValue::Null
        } else {
            self.kind.zero_value()
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable && !self.kind.is_reference() {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl FromStr for ColumnType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.strip_suffix('?') {
            Some(base) => Ok(ColumnType::nullable(base.parse()?)),
            None => Ok(ColumnType::required(trimmed.parse()?)),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Field Value
// =============================================================================

/// A typed cell of an output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Double(f64),
    DateTime(DateTime<Utc>),
    String(String),
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int32(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_types() {
        assert_eq!(
            "int32?".parse::<ColumnType>().unwrap(),
            ColumnType::nullable(SemanticType::Int32)
        );
        assert_eq!(
            "Boolean".parse::<ColumnType>().unwrap(),
            ColumnType::required(SemanticType::Boolean)
        );
        assert_eq!(
            "timestamp?".parse::<ColumnType>().unwrap(),
            ColumnType::nullable(SemanticType::DateTime)
        );
    }

    #[test]
    fn test_string_is_always_nullable() {
        let plain: ColumnType = "string".parse().unwrap();
        let marked: ColumnType = "string?".parse().unwrap();
        assert_eq!(plain, marked);
        assert!(plain.is_nullable());
        assert_eq!(plain.to_string(), "string");
    }

    #[test]
    fn test_parse_composite_types() {
        let array: ColumnType = "array<double>".parse().unwrap();
        assert_eq!(
            array.kind(),
            &SemanticType::ArrayOf(Box::new(SemanticType::Double))
        );

        let map: ColumnType = "map<string, array<int32>>".parse().unwrap();
        assert_eq!(map.to_string(), "map<string, array<int32>>");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("int64?".parse::<ColumnType>().is_err());
        assert!("map<int32, string>".parse::<ColumnType>().is_err());
        assert!("array<>".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_implicit_default() {
        assert_eq!(
            ColumnType::required(SemanticType::Int32).implicit_default(),
            FieldValue::Int32(0)
        );
        assert_eq!(
            ColumnType::nullable(SemanticType::Int32).implicit_default(),
            FieldValue::Null
        );
        assert_eq!(
            ColumnType::required(SemanticType::String).implicit_default(),
            FieldValue::Null
        );
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let value = FieldValue::Array(vec![FieldValue::Int32(1), FieldValue::Null]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,null]");
    }
}
