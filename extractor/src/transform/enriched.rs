//! Enriched-event TSV to canonical JSON.
//!
//! An enriched event is one line of 131 tab-separated positional fields. The
//! [`EnrichedEventTransformer`] turns it into a flat JSON object:
//!
//! ```text
//! app_id  platform  etl_tstamp            ...  contexts (self-describing JSON)  ...
//!   │        │          │                            │
//!   ▼        ▼          ▼                            ▼
//! {"app_id": "shop", "platform": "web", "etl_tstamp": "2017-01-26T00:01:25.292Z",
//!  "contexts_com_acme_product_1": [{"sku": "A1"}, {"sku": "B2"}], ...}
//! ```
//!
//! - Empty fields are omitted.
//! - Integers, doubles and `1`/`0` booleans become JSON numbers and booleans.
//! - Timestamps `YYYY-MM-DD hh:mm:ss.fff` become `YYYY-MM-DDThh:mm:ss.fffZ`.
//! - `contexts`, `derived_contexts` and `unstruct_event` are shredded into one
//!   key per Iglu schema: `{prefix}_{vendor}_{name}_{model}`.
//!
//! Every field-level problem on a line is collected and reported together.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::error::{TransformationError, TransformationResult};

/// Number of positional fields in an enriched event.
pub const ENRICHED_EVENT_FIELD_COUNT: usize = 131;

/// Iglu schema URI: `iglu:{vendor}/{name}/{format}/{model}-{revision}-{addition}`.
pub const SCHEMA_PATTERN: &str =
    r"^iglu:([a-zA-Z0-9\-_.]+)/([a-zA-Z0-9\-_]+)/[a-zA-Z0-9\-_]+/([0-9]+-[0-9]+-[0-9]+)$";

static SCHEMA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(SCHEMA_PATTERN).expect("Invalid Iglu schema pattern"));

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new("([^A-Z_])([A-Z])").expect("Invalid camel case pattern"));

/// How a positional field is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    String,
    Int,
    Bool,
    Double,
    Timestamp,
    Contexts,
    Unstruct,
}

use FieldKind as K;

static ENRICHED_EVENT_FIELDS: [(&str, FieldKind); ENRICHED_EVENT_FIELD_COUNT] = [
    ("app_id", K::String),
    ("platform", K::String),
    ("etl_tstamp", K::Timestamp),
    ("collector_tstamp", K::Timestamp),
    ("dvce_created_tstamp", K::Timestamp),
    ("event", K::String),
    ("event_id", K::String),
    ("txn_id", K::Int),
    ("name_tracker", K::String),
    ("v_tracker", K::String),
    ("v_collector", K::String),
    ("v_etl", K::String),
    ("user_id", K::String),
    ("user_ipaddress", K::String),
    ("user_fingerprint", K::String),
    ("domain_userid", K::String),
    ("domain_sessionidx", K::Int),
    ("network_userid", K::String),
    ("geo_country", K::String),
    ("geo_region", K::String),
    ("geo_city", K::String),
    ("geo_zipcode", K::String),
    ("geo_latitude", K::Double),
    ("geo_longitude", K::Double),
    ("geo_region_name", K::String),
    ("ip_isp", K::String),
    ("ip_organization", K::String),
    ("ip_domain", K::String),
    ("ip_netspeed", K::String),
    ("page_url", K::String),
    ("page_title", K::String),
    ("page_referrer", K::String),
    ("page_urlscheme", K::String),
    ("page_urlhost", K::String),
    ("page_urlport", K::Int),
    ("page_urlpath", K::String),
    ("page_urlquery", K::String),
    ("page_urlfragment", K::String),
    ("refr_urlscheme", K::String),
    ("refr_urlhost", K::String),
    ("refr_urlport", K::Int),
    ("refr_urlpath", K::String),
    ("refr_urlquery", K::String),
    ("refr_urlfragment", K::String),
    ("refr_medium", K::String),
    ("refr_source", K::String),
    ("refr_term", K::String),
    ("mkt_medium", K::String),
    ("mkt_source", K::String),
    ("mkt_term", K::String),
    ("mkt_content", K::String),
    ("mkt_campaign", K::String),
    ("contexts", K::Contexts),
    ("se_category", K::String),
    ("se_action", K::String),
    ("se_label", K::String),
    ("se_property", K::String),
    ("se_value", K::Double),
    ("unstruct_event", K::Unstruct),
    ("tr_orderid", K::String),
    ("tr_affiliation", K::String),
    ("tr_total", K::Double),
    ("tr_tax", K::Double),
    ("tr_shipping", K::Double),
    ("tr_city", K::String),
    ("tr_state", K::String),
    ("tr_country", K::String),
    ("ti_orderid", K::String),
    ("ti_sku", K::String),
    ("ti_name", K::String),
    ("ti_category", K::String),
    ("ti_price", K::Double),
    ("ti_quantity", K::Int),
    ("pp_xoffset_min", K::Int),
    ("pp_xoffset_max", K::Int),
    ("pp_yoffset_min", K::Int),
    ("pp_yoffset_max", K::Int),
    ("useragent", K::String),
    ("br_name", K::String),
    ("br_family", K::String),
    ("br_version", K::String),
    ("br_type", K::String),
    ("br_renderengine", K::String),
    ("br_lang", K::String),
    ("br_features_pdf", K::Bool),
    ("br_features_flash", K::Bool),
    ("br_features_java", K::Bool),
    ("br_features_director", K::Bool),
    ("br_features_quicktime", K::Bool),
    ("br_features_realplayer", K::Bool),
    ("br_features_windowsmedia", K::Bool),
    ("br_features_gears", K::Bool),
    ("br_features_silverlight", K::Bool),
    ("br_cookies", K::Bool),
    ("br_colordepth", K::String),
    ("br_viewwidth", K::Int),
    ("br_viewheight", K::Int),
    ("os_name", K::String),
    ("os_family", K::String),
    ("os_manufacturer", K::String),
    ("os_timezone", K::String),
    ("dvce_type", K::String),
    ("dvce_ismobile", K::Bool),
    ("dvce_screenwidth", K::Int),
    ("dvce_screenheight", K::Int),
    ("doc_charset", K::String),
    ("doc_width", K::Int),
    ("doc_height", K::Int),
    ("tr_currency", K::String),
    ("tr_total_base", K::Double),
    ("tr_tax_base", K::Double),
    ("tr_shipping_base", K::Double),
    ("ti_currency", K::String),
    ("ti_price_base", K::Double),
    ("base_currency", K::String),
    ("geo_timezone", K::String),
    ("mkt_clickid", K::String),
    ("mkt_network", K::String),
    ("etl_tags", K::String),
    ("dvce_sent_tstamp", K::Timestamp),
    ("refr_domain_userid", K::String),
    ("refr_device_tstamp", K::Timestamp),
    ("derived_contexts", K::Contexts),
    ("domain_sessionid", K::String),
    ("derived_tstamp", K::Timestamp),
    ("event_vendor", K::String),
    ("event_name", K::String),
    ("event_format", K::String),
    ("event_version", K::String),
    ("event_fingerprint", K::String),
    ("true_tstamp", K::Timestamp),
];

/// Position of a field in the enriched-event TSV layout.
pub fn field_position(name: &str) -> Option<usize> {
    ENRICHED_EVENT_FIELDS.iter().position(|(n, _)| *n == name)
}

/// Field names in TSV order.
pub fn field_names() -> impl Iterator<Item = &'static str> {
    ENRICHED_EVENT_FIELDS.iter().map(|(name, _)| *name)
}

// =============================================================================
// Line Transformer Seam
// =============================================================================

/// Converts one raw input line into a canonical JSON object string.
///
/// On failure, returns every reason the line could not be converted.
pub trait LineTransformer {
    fn transform(&self, line: &str) -> TransformationResult<String>;
}

impl<F> LineTransformer for F
where
    F: Fn(&str) -> TransformationResult<String>,
{
    fn transform(&self, line: &str) -> TransformationResult<String> {
        self(line)
    }
}

/// Line transformer for Snowplow enriched events.
#[derive(Debug, Clone, Copy)]
pub struct EnrichedEventTransformer {
    /// Add `geo_location = "{lat},{lon}"` when both coordinates are present.
    pub add_geolocation: bool,
}

impl Default for EnrichedEventTransformer {
    fn default() -> Self {
        Self {
            add_geolocation: true,
        }
    }
}

impl EnrichedEventTransformer {
    pub fn new(add_geolocation: bool) -> Self {
        Self { add_geolocation }
    }

    /// Transform a line into a canonical record without serializing it.
    pub fn transform_to_record(&self, line: &str) -> TransformationResult<Map<String, Value>> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != ENRICHED_EVENT_FIELD_COUNT {
            return Err(TransformationError::single(format!(
                "Expected {} fields, received {} fields.",
                ENRICHED_EVENT_FIELD_COUNT,
                fields.len()
            )));
        }

        let mut output = Map::new();
        let mut errors = Vec::new();

        for (&(key, kind), &value) in ENRICHED_EVENT_FIELDS.iter().zip(fields.iter()) {
            if value.is_empty() {
                continue;
            }

            match convert(key, kind, value) {
                Ok(pairs) => {
                    for (k, v) in pairs {
                        merge_field(&mut output, k, v);
                    }
                }
                Err(mut messages) => errors.append(&mut messages),
            }
        }

        if !errors.is_empty() {
            return Err(TransformationError::new(errors));
        }

        if self.add_geolocation {
            if let (Some(lat), Some(lon)) = (
                output.get("geo_latitude").filter(|v| !v.is_null()),
                output.get("geo_longitude").filter(|v| !v.is_null()),
            ) {
                let location = format!("{},{}", lat, lon);
                output.insert("geo_location".to_string(), Value::String(location));
            }
        }

        Ok(output)
    }
}

impl LineTransformer for EnrichedEventTransformer {
    fn transform(&self, line: &str) -> TransformationResult<String> {
        let record = self.transform_to_record(line)?;
        Ok(Value::Object(record).to_string())
    }
}

/// Shredded context arrays sharing a key are concatenated.
fn merge_field(output: &mut Map<String, Value>, key: String, value: Value) {
    match (output.get_mut(&key), value) {
        (Some(Value::Array(existing)), Value::Array(mut more)) => existing.append(&mut more),
        (_, value) => {
            output.insert(key, value);
        }
    }
}

// =============================================================================
// Field Conversions
// =============================================================================

type Converted = Result<Vec<(String, Value)>, Vec<String>>;

fn convert(key: &str, kind: FieldKind, value: &str) -> Converted {
    match kind {
        FieldKind::String => Ok(single(key, Value::String(value.to_string()))),
        FieldKind::Int => value
            .parse::<i32>()
            .map(|i| single(key, Value::Number(i.into())))
            .map_err(|e| vec![unexpected(key, value, e)]),
        FieldKind::Bool => match value {
            "1" => Ok(single(key, Value::Bool(true))),
            "0" => Ok(single(key, Value::Bool(false))),
            _ => Err(vec![unexpected(key, value, "expected 1 or 0")]),
        },
        FieldKind::Double => value
            .parse::<f64>()
            .map_err(|e| e.to_string())
            .and_then(|f| Number::from_f64(f).ok_or_else(|| "value is not finite".to_string()))
            .map(|n| single(key, Value::Number(n)))
            .map_err(|reason| vec![unexpected(key, value, reason)]),
        FieldKind::Timestamp => {
            let iso = format!("{}Z", value.replace(' ', "T"));
            Ok(single(key, Value::String(iso)))
        }
        FieldKind::Contexts => shred_contexts(key, value),
        FieldKind::Unstruct => shred_unstruct(key, value),
    }
}

fn single(key: &str, value: Value) -> Vec<(String, Value)> {
    vec![(key.to_string(), value)]
}

fn unexpected(key: &str, value: &str, reason: impl std::fmt::Display) -> String {
    format!(
        "Unexpected exception parsing field with key {} and value {}: {}",
        key, value, reason
    )
}

/// `{"schema": ..., "data": [{"schema": "iglu:...", "data": {...}}, ...]}`
fn shred_contexts(key: &str, value: &str) -> Converted {
    let envelope: Value =
        serde_json::from_str(value).map_err(|e| vec![unexpected(key, value, e)])?;

    let contexts = envelope
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| vec![unexpected(key, value, "missing data array")])?;

    let mut shredded: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for context in contexts {
        let schema = context
            .get("schema")
            .and_then(Value::as_str)
            .ok_or_else(|| vec![unexpected(key, value, "context without schema")])?;
        let data = context
            .get("data")
            .ok_or_else(|| vec![unexpected(key, value, "context without data")])?;

        let column = fix_schema("contexts", schema).map_err(|e| vec![e])?;
        shredded.entry(column).or_default().push(data.clone());
    }

    Ok(shredded
        .into_iter()
        .map(|(column, items)| (column, Value::Array(items)))
        .collect())
}

/// `{"schema": ..., "data": {"schema": "iglu:...", "data": {...}}}`
fn shred_unstruct(key: &str, value: &str) -> Converted {
    let envelope: Value =
        serde_json::from_str(value).map_err(|e| vec![unexpected(key, value, e)])?;

    let event = envelope
        .get("data")
        .ok_or_else(|| vec![unexpected(key, value, "missing data object")])?;
    let schema = event
        .get("schema")
        .and_then(Value::as_str)
        .ok_or_else(|| vec![unexpected(key, value, "unstructured event without schema")])?;
    let data = event
        .get("data")
        .ok_or_else(|| vec!["Could not extract inner data field from unstructured event".to_string()])?;

    let column = fix_schema("unstruct_event", schema).map_err(|e| vec![e])?;
    Ok(vec![(column, data.clone())])
}

/// Column name for a shredded Iglu schema, e.g.
/// `iglu:com.acme-corp/addToCart/jsonschema/1-0-2` with prefix `contexts`
/// gives `contexts_com_acme_corp_add_to_cart_1`.
pub fn fix_schema(prefix: &str, schema: &str) -> Result<String, String> {
    let captures = SCHEMA_URI.captures(schema).ok_or_else(|| {
        format!(
            "Schema {} does not conform to regular expression {}",
            schema, SCHEMA_PATTERN
        )
    })?;

    let vendor = captures[1].replace(['.', '-'], "_").to_lowercase();
    let name = CAMEL_BOUNDARY
        .replace_all(&captures[2], "${1}_${2}")
        .to_lowercase();
    let model = captures[3].split('-').next().unwrap_or_default();

    Ok(format!("{}_{}_{}_{}", prefix, vendor, name, model))
}
