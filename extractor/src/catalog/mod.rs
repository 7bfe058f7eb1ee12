//! Field type catalog for Snowplow enriched events.
//!
//! Maps every canonical field name produced by the line transformer to its
//! [`SemanticType`]. The table is built once on first use and never mutated,
//! so it can be shared by any number of concurrent extractions.
//!
//! Custom entity and self-describing event columns are named per deployment
//! (`contexts_com_acme_product_1`, `unstruct_event_com_acme_click_1`, ...)
//! and cannot be listed here. Any column starting with `contexts` or
//! `unstruct` that is not in the table belongs to such a dynamic family and is
//! typed as a string.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::{ColumnType, SemanticType};

/// Name prefixes of dynamically-named field families.
pub const DYNAMIC_FAMILY_PREFIXES: [&str; 2] = ["contexts", "unstruct"];

/// Catalog entries in canonical order.
static ENRICHED_EVENT_FIELDS: Lazy<Vec<(&'static str, SemanticType)>> = Lazy::new(|| {
    use SemanticType as T;
    vec![
        ("app_id", T::String),
        ("platform", T::String),
        ("etl_tstamp", T::DateTime),
        ("collector_tstamp", T::DateTime),
        ("dvce_created_tstamp", T::DateTime),
        ("event", T::String),
        ("event_id", T::String),
        ("txn_id", T::Int32),
        ("name_tracker", T::String),
        ("v_tracker", T::String),
        ("v_collector", T::String),
        ("v_etl", T::String),
        ("user_id", T::String),
        ("user_ipaddress", T::String),
        ("user_fingerprint", T::String),
        ("domain_userid", T::String),
        ("domain_sessionidx", T::Int32),
        ("network_userid", T::String),
        ("geo_country", T::String),
        ("geo_region", T::String),
        ("geo_city", T::String),
        ("geo_zipcode", T::String),
        ("geo_location", T::String),
        ("geo_latitude", T::Double),
        ("geo_longitude", T::Double),
        ("geo_region_name", T::String),
        ("ip_isp", T::String),
        ("ip_organization", T::String),
        ("ip_domain", T::String),
        ("ip_netspeed", T::String),
        ("page_url", T::String),
        ("page_title", T::String),
        ("page_referrer", T::String),
        ("page_urlscheme", T::String),
        ("page_urlhost", T::String),
        ("page_urlport", T::Int32),
        ("page_urlpath", T::String),
        ("page_urlquery", T::String),
        ("page_urlfragment", T::String),
        ("refr_urlscheme", T::String),
        ("refr_urlhost", T::String),
        ("refr_urlport", T::Int32),
        ("refr_urlpath", T::String),
        ("refr_urlquery", T::String),
        ("refr_urlfragment", T::String),
        ("refr_medium", T::String),
        ("refr_source", T::String),
        ("refr_term", T::String),
        ("mkt_medium", T::String),
        ("mkt_source", T::String),
        ("mkt_term", T::String),
        ("mkt_content", T::String),
        ("mkt_campaign", T::String),
        ("contexts", T::String),
        ("se_category", T::String),
        ("se_action", T::String),
        ("se_label", T::String),
        ("se_property", T::String),
        ("se_value", T::String),
        ("unstruct_event", T::String),
        ("tr_orderid", T::String),
        ("tr_affiliation", T::String),
        ("tr_total", T::Double),
        ("tr_tax", T::Double),
        ("tr_shipping", T::Double),
        ("tr_city", T::String),
        ("tr_state", T::String),
        ("tr_country", T::String),
        ("ti_orderid", T::String),
        ("ti_sku", T::String),
        ("ti_name", T::String),
        ("ti_category", T::String),
        ("ti_price", T::Double),
        ("ti_quantity", T::Int32),
        ("pp_xoffset_min", T::Int32),
        ("pp_xoffset_max", T::Int32),
        ("pp_yoffset_min", T::Int32),
        ("pp_yoffset_max", T::Int32),
        ("useragent", T::String),
        ("br_name", T::String),
        ("br_family", T::String),
        ("br_version", T::String),
        ("br_type", T::String),
        ("br_renderengine", T::String),
        ("br_lang", T::String),
        ("br_features_pdf", T::Boolean),
        ("br_features_flash", T::Boolean),
        ("br_features_java", T::Boolean),
        ("br_features_director", T::Boolean),
        ("br_features_quicktime", T::Boolean),
        ("br_features_realplayer", T::Boolean),
        ("br_features_windowsmedia", T::Boolean),
        ("br_features_gears", T::Boolean),
        ("br_features_silverlight", T::Boolean),
        ("br_cookies", T::Boolean),
        ("br_colordepth", T::String),
        ("br_viewwidth", T::Int32),
        ("br_viewheight", T::Int32),
        ("os_name", T::String),
        ("os_family", T::String),
        ("os_manufacturer", T::String),
        ("os_timezone", T::String),
        ("dvce_type", T::String),
        ("dvce_ismobile", T::Boolean),
        ("dvce_screenwidth", T::Int32),
        ("dvce_screenheight", T::Int32),
        ("doc_charset", T::String),
        ("doc_width", T::Int32),
        ("doc_height", T::Int32),
        ("tr_currency", T::String),
        ("tr_total_base", T::Double),
        ("tr_tax_base", T::Double),
        ("tr_shipping_base", T::Double),
        ("ti_currency", T::String),
        ("ti_price_base", T::Double),
        ("base_currency", T::String),
        ("geo_timezone", T::String),
        ("mkt_clickid", T::String),
        ("mkt_network", T::String),
        ("etl_tags", T::String),
        ("dvce_sent_tstamp", T::DateTime),
        ("refr_domain_userid", T::String),
        ("refr_device_tstamp", T::DateTime),
        ("derived_contexts", T::String),
        ("domain_sessionid", T::String),
        ("derived_tstamp", T::DateTime),
        ("event_vendor", T::String),
        ("event_name", T::String),
        ("event_format", T::String),
        ("event_version", T::String),
        ("event_fingerprint", T::String),
        ("true_tstamp", T::DateTime),
    ]
});

static FIELD_TYPES: Lazy<HashMap<&'static str, SemanticType>> =
    Lazy::new(|| ENRICHED_EVENT_FIELDS.iter().cloned().collect());

/// Semantic type of a catalog field, exact name match only.
pub fn lookup(name: &str) -> Option<&'static SemanticType> {
    FIELD_TYPES.get(name)
}

/// True if `name` belongs to the `contexts*` or `unstruct*` families.
///
/// Case-sensitive, and independent of whether the catalog knows the name.
pub fn is_dynamic_family(name: &str) -> bool {
    DYNAMIC_FAMILY_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Column type every uncatalogued `contexts*` / `unstruct*` column must declare.
pub fn dynamic_family_type() -> ColumnType {
    ColumnType::nullable(SemanticType::String)
}

/// Column type a schema must declare for `name`, if the name is extractable.
pub fn expected_column_type(name: &str) -> Option<ColumnType> {
    match lookup(name) {
        Some(kind) => Some(ColumnType::nullable(kind.clone())),
        None if is_dynamic_family(name) => Some(dynamic_family_type()),
        None => None,
    }
}

/// Every catalog entry in canonical order.
pub fn fields() -> impl Iterator<Item = (&'static str, &'static SemanticType)> {
    ENRICHED_EVENT_FIELDS.iter().map(|(name, kind)| (*name, kind))
}

/// Number of catalog entries.
pub fn len() -> usize {
    ENRICHED_EVENT_FIELDS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_keys_are_unique() {
        let names: HashSet<_> = fields().map(|(name, _)| name).collect();
        assert_eq!(names.len(), len());
        assert_eq!(len(), 132);
    }

    #[test]
    fn test_lookup_exact_match() {
        assert_eq!(lookup("app_id"), Some(&SemanticType::String));
        assert_eq!(lookup("pp_xoffset_min"), Some(&SemanticType::Int32));
        assert_eq!(lookup("tr_total"), Some(&SemanticType::Double));
        assert_eq!(lookup("br_cookies"), Some(&SemanticType::Boolean));
        assert_eq!(lookup("collector_tstamp"), Some(&SemanticType::DateTime));
        assert_eq!(lookup("App_Id"), None);
        assert_eq!(lookup("app_id "), None);
    }

    #[test]
    fn test_dynamic_family() {
        assert!(is_dynamic_family("contexts_com_acme_product_1"));
        assert!(is_dynamic_family("unstruct_event_com_acme_click_1"));
        assert!(is_dynamic_family("contexts"));
        assert!(!is_dynamic_family("Contexts_com_acme"));
        assert!(!is_dynamic_family("derived_contexts"));
        assert!(!is_dynamic_family("ctx"));
        assert!(!is_dynamic_family(""));
    }

    #[test]
    fn test_expected_column_type() {
        assert_eq!(
            expected_column_type("txn_id"),
            Some(ColumnType::nullable(SemanticType::Int32))
        );
        assert_eq!(
            expected_column_type("contexts_com_acme_product_1"),
            Some(ColumnType::nullable(SemanticType::String))
        );
        assert_eq!(expected_column_type("unknown_field"), None);
    }

    #[test]
    fn test_fields_keep_canonical_order() {
        let first: Vec<_> = fields().take(3).map(|(name, _)| name).collect();
        assert_eq!(first, vec!["app_id", "platform", "etl_tstamp"]);
        assert_eq!(fields().last().map(|(name, _)| name), Some("true_tstamp"));
    }
}
