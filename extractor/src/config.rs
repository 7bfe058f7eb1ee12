//! Extraction options.
//!
//! Options come from three layers, later ones winning: built-in defaults,
//! the environment (with `.env` loaded via `dotenvy`), then command-line
//! flags applied by the binary.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const ENV_SCHEMA: &str = "SNOWPLOW_SCHEMA";
pub const ENV_OUTPUT_DIR: &str = "SNOWPLOW_OUTPUT_DIR";
pub const ENV_ADD_GEOLOCATION: &str = "SNOWPLOW_ADD_GEOLOCATION";
pub const ENV_QUIET: &str = "SNOWPLOW_QUIET";
pub const ENV_LOG_JSON: &str = "SNOWPLOW_LOG_JSON";

/// Options for an extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Schema file (JSON array of column declarations)
    pub schema_path: Option<PathBuf>,

    /// Write one `<stem>.ndjson` per input here instead of stdout
    pub output_dir: Option<PathBuf>,

    /// Add `geo_location` when latitude and longitude are both present
    pub add_geolocation: bool,

    /// Suppress diagnostic logging
    pub quiet: bool,

    /// Log as JSON lines
    pub log_json: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            schema_path: None,
            output_dir: None,
            add_geolocation: true,
            quiet: false,
            log_json: false,
        }
    }
}

impl ExtractOptions {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable name.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            schema_path: non_empty(ENV_SCHEMA).map(PathBuf::from),
            output_dir: non_empty(ENV_OUTPUT_DIR).map(PathBuf::from),
            add_geolocation: non_empty(ENV_ADD_GEOLOCATION)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.add_geolocation),
            quiet: non_empty(ENV_QUIET)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.quiet),
            log_json: non_empty(ENV_LOG_JSON)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.log_json),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert!(options.add_geolocation);
        assert!(!options.quiet);
        assert_eq!(options.schema_path, None);
        assert_eq!(ExtractOptions::from_lookup(lookup(&[])), options);
    }

    #[test]
    fn test_environment_overrides() {
        let options = ExtractOptions::from_lookup(lookup(&[
            (ENV_SCHEMA, "schemas/web.json"),
            (ENV_OUTPUT_DIR, "/tmp/out"),
            (ENV_ADD_GEOLOCATION, "false"),
            (ENV_QUIET, "1"),
            (ENV_LOG_JSON, "yes"),
        ]));

        assert_eq!(options.schema_path, Some(PathBuf::from("schemas/web.json")));
        assert_eq!(options.output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(!options.add_geolocation);
        assert!(options.quiet);
        assert!(options.log_json);
    }

    #[test]
    fn test_blank_and_unparseable_values_keep_defaults() {
        let options = ExtractOptions::from_lookup(lookup(&[
            (ENV_SCHEMA, "  "),
            (ENV_ADD_GEOLOCATION, "maybe"),
        ]));

        assert_eq!(options.schema_path, None);
        assert!(options.add_geolocation);
    }
}
