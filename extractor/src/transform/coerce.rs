//! JSON token to typed value coercion.
//!
//! [`coerce`] converts one canonical JSON value into a [`FieldValue`] of the
//! requested [`SemanticType`]. It returns `None` whenever the value cannot be
//! represented as that type, and for JSON null. Callers treat `None` as "use
//! the column default"; it is never an error.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::models::{FieldValue, SemanticType};

/// Naive timestamp layouts accepted for `datetime` columns, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Coerce a JSON value to `target`.
pub fn coerce(value: &Value, target: &SemanticType) -> Option<FieldValue> {
    if value.is_null() {
        return None;
    }

    match target {
        SemanticType::Boolean => to_boolean(value).map(FieldValue::Boolean),
        SemanticType::Int32 => to_int32(value).map(FieldValue::Int32),
        SemanticType::Double => to_double(value).map(FieldValue::Double),
        SemanticType::DateTime => to_datetime(value).map(FieldValue::DateTime),
        SemanticType::String => Some(FieldValue::String(to_text(value))),
        SemanticType::ArrayOf(inner) => {
            let items = value.as_array()?;
            items
                .iter()
                .map(|item| coerce_element(item, inner))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::Array)
        }
        SemanticType::MapOf(inner) => {
            let entries = value.as_object()?;
            entries
                .iter()
                .map(|(k, v)| coerce_element(v, inner).map(|v| (k.clone(), v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(FieldValue::Map)
        }
    }
}

/// Elements of arrays and maps keep nulls; any other miss fails the container.
fn coerce_element(value: &Value, target: &SemanticType) -> Option<FieldValue> {
    if value.is_null() {
        Some(FieldValue::Null)
    } else {
        coerce(value, target)
    }
}

fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_int32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => number_to_i32(n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_to_i32(n: &Number) -> Option<i32> {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).ok();
    }

    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

fn to_double(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Strings verbatim, everything else as compact JSON text.
fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
