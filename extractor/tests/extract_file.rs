//! File-backed extraction, end to end.

use serde_json::{json, Value};
use snowplow_extractor::transform::enriched::field_position;
use snowplow_extractor::{
    extract_file, validate_schema, write_ndjson, ErrorKind, ExtractionError, FieldValue, Schema,
    ENRICHED_EVENT_FIELD_COUNT,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, NamedTempFile};

const WEB_SCHEMA: &str = include_str!("../schemas/web.json");

fn line(fields: &[(&str, &str)]) -> String {
    let mut values = vec![""; ENRICHED_EVENT_FIELD_COUNT];
    for (name, value) in fields {
        values[field_position(name).unwrap()] = *value;
    }
    values.join("\t")
}

fn page_view(app_id: &str) -> String {
    let contexts = json!({
        "schema": "iglu:com.snowplowanalytics.snowplow/contexts/jsonschema/1-0-0",
        "data": [{
            "schema": "iglu:com.snowplowanalytics.snowplow/web_page/jsonschema/1-0-0",
            "data": { "id": "c8b2d1" }
        }]
    })
    .to_string();

    line(&[
        ("app_id", app_id),
        ("platform", "web"),
        ("collector_tstamp", "2013-11-26 00:02:05"),
        ("event", "page_view"),
        ("event_id", "c6ef3124-b53a-4b13-a233-0088f79dcbcb"),
        ("geo_country", "DE"),
        ("geo_latitude", "52.5"),
        ("geo_longitude", "13.4"),
        ("page_url", "http://www.example.com"),
        ("br_cookies", "1"),
        ("contexts", contexts.as_str()),
    ])
}

fn write_events(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for l in lines {
        writeln!(file, "{}", l).unwrap();
    }
    file.flush().unwrap();
    file
}

fn web_schema() -> Arc<Schema> {
    Arc::new(Schema::from_json(WEB_SCHEMA).unwrap())
}

#[test]
fn test_bundled_schema_is_valid() {
    assert!(validate_schema(&web_schema()).is_ok());
}

#[test]
fn test_extracts_typed_rows_from_file() {
    let file = write_events(&[page_view("shop"), page_view("blog")]);

    let rows: Vec<_> = extract_file(file.path(), web_schema())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    let first = &rows[0];
    assert_eq!(first.len(), web_schema().len());
    assert_eq!(first.get("app_id").and_then(FieldValue::as_str), Some("shop"));
    assert_eq!(first.get("geo_latitude").and_then(FieldValue::as_f64), Some(52.5));
    assert_eq!(first.get("geo_location").and_then(FieldValue::as_str), Some("52.5,13.4"));
    assert_eq!(first.get("br_cookies"), Some(&FieldValue::Boolean(true)));
    assert_eq!(first.get("txn_id"), Some(&FieldValue::Null));
    assert_eq!(first.get("tr_total"), Some(&FieldValue::Double(0.0)));
    assert_eq!(
        first
            .get("contexts_com_snowplowanalytics_snowplow_web_page_1")
            .and_then(FieldValue::as_str),
        Some(r#"[{"id":"c8b2d1"}]"#)
    );
    assert!(first.get("collector_tstamp").and_then(FieldValue::as_datetime).is_some());
    assert_eq!(rows[1].get("app_id").and_then(FieldValue::as_str), Some("blog"));
}

#[test]
fn test_ndjson_output() {
    let file = write_events(&[page_view("shop")]);
    let dir = tempdir().unwrap();
    let target = dir.path().join("events.ndjson");

    let rows = extract_file(file.path(), web_schema()).unwrap();
    let written = write_ndjson(rows, fs::File::create(&target).unwrap()).unwrap();
    assert_eq!(written, 1);

    let content = fs::read_to_string(&target).unwrap();
    let first_line = content.lines().next().unwrap();
    let value: Value = serde_json::from_str(first_line).unwrap();
    assert_eq!(value.as_object().unwrap().len(), web_schema().len());
    assert_eq!(value["app_id"], "shop");
    assert_eq!(value["collector_tstamp"], "2013-11-26T00:02:05Z");
    assert_eq!(value["pp_xoffset_min"], Value::Null);
}

#[test]
fn test_malformed_line_stops_extraction() {
    let file = write_events(&[page_view("shop"), "too\tfew\tfields".to_string(), page_view("blog")]);

    let mut rows = extract_file(file.path(), web_schema()).unwrap();
    assert!(rows.next().unwrap().is_ok());

    let err = rows.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transformation);
    assert_eq!(err.messages(), vec!["Expected 131 fields, received 3 fields."]);
    assert!(rows.next().is_none());
    assert_eq!(rows.rows_emitted(), 1);
}

#[test]
fn test_invalid_schema_yields_no_rows() {
    let file = write_events(&[page_view("shop")]);
    let schema = Arc::new(
        Schema::from_json(
            r#"[
                { "name": "app_id", "type": "string" },
                { "name": "pp_xoffset_min", "type": "string" },
                { "name": "unknown_field", "type": "string" }
            ]"#,
        )
        .unwrap(),
    );

    let results: Vec<_> = extract_file(file.path(), schema).unwrap().collect();
    assert_eq!(results.len(), 1);
    match &results[0] {
        Err(ExtractionError::Schema { violations }) => {
            let messages: Vec<_> = violations.iter().map(|v| v.to_string()).collect();
            assert_eq!(
                messages,
                vec![
                    "Invalid columnType string for columnName pp_xoffset_min; expected columnType: int32?",
                    "Invalid columnName unknown_field",
                ]
            );
        }
        other => panic!("expected schema error, got {:?}", other.as_ref().map(|r| r.len())),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.tsv");

    match extract_file(Path::new(&missing), web_schema()) {
        Err(err) => assert_eq!(err.kind(), ErrorKind::Io),
        Ok(_) => panic!("opened a missing file"),
    }
}

#[test]
fn test_latin1_byte_does_not_stop_extraction() {
    let mut first = line(&[("app_id", "shop"), ("page_title", "caf_")]).into_bytes();
    let at = first.iter().position(|&b| b == b'_').unwrap();
    first[at] = 0xE9;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&first).unwrap();
    file.write_all(b"\n").unwrap();
    writeln!(file, "{}", line(&[("app_id", "blog")])).unwrap();
    file.flush().unwrap();

    let schema = Arc::new(
        Schema::from_json(r#"[{ "name": "app_id", "type": "string" }, { "name": "page_title", "type": "string" }]"#)
            .unwrap(),
    );
    let rows: Vec<_> = extract_file(file.path(), schema)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("page_title").and_then(FieldValue::as_str), Some("caf\u{FFFD}"));
    assert_eq!(rows[1].get("app_id").and_then(FieldValue::as_str), Some("blog"));
}
