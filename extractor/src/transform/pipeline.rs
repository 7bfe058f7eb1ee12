//! Lazy extraction pipeline.
//!
//! An [`Extractor`] pulls lines from a reader and drives each one through
//!
//! ```text
//! Validate ──▶ Transform ──▶ Materialize ──▶ Emit
//!    │             │
//!    └──── Fail ◀──┘
//! ```
//!
//! Rows are produced only when the caller asks for the next one. The first
//! failure is yielded as an [`ExtractionError`] and ends the sequence; rows
//! yielded before it stay valid. The reader is owned by the extractor and is
//! dropped as soon as the sequence ends, whichever way it ends.
//!
//! # Example
//!
//! ```rust,ignore
//! use snowplow_extractor::{extract_file, Schema};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(Schema::load("schema.json")?);
//! for row in extract_file("events.tsv", schema)? {
//!     let row = row?;
//!     println!("{}", serde_json::to_string(&row)?);
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::Arc;

use super::enriched::{EnrichedEventTransformer, LineTransformer};
use super::materialize::{fill_row, CanonicalRecord};
use crate::error::{ExtractionError, ExtractionResult, TransformationError};
use crate::logs::{log_error, log_success};
use crate::models::{Row, RowBuffer};
use crate::schema::Schema;
use crate::validation::validate_schema;

/// Pull-based row iterator over one input stream.
pub struct Extractor<R, T = EnrichedEventTransformer> {
    /// `None` once the reader has been released.
    reader: Option<R>,
    /// Raw bytes of the current line.
    raw: Vec<u8>,
    transformer: T,
    buffer: RowBuffer,
    schema_checked: bool,
    line_number: usize,
    rows_emitted: usize,
    source: String,
}

impl<R: BufRead> Extractor<R, EnrichedEventTransformer> {
    /// Extractor for enriched-event TSV.
    pub fn new(reader: R, schema: Arc<Schema>) -> Self {
        Self::with_transformer(reader, schema, EnrichedEventTransformer::default())
    }
}

impl<R: BufRead, T: LineTransformer> Extractor<R, T> {
    /// Extractor using a custom line transformer.
    pub fn with_transformer(reader: R, schema: Arc<Schema>, transformer: T) -> Self {
        Self {
            reader: Some(reader),
            raw: Vec::new(),
            transformer,
            buffer: RowBuffer::new(schema),
            schema_checked: false,
            line_number: 0,
            rows_emitted: 0,
            source: "<input>".to_string(),
        }
    }

    /// Label used in log messages.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.buffer.schema()
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    /// True once the underlying reader has been dropped.
    pub fn is_released(&self) -> bool {
        self.reader.is_none()
    }

    fn release(&mut self) {
        self.reader = None;
    }

    /// Next line without its `\n` / `\r\n` ending, or `None` at end of stream.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD; only real read failures are errors.
    fn read_line(&mut self) -> Option<io::Result<String>> {
        let reader = self.reader.as_mut()?;
        self.raw.clear();

        match reader.read_until(b'\n', &mut self.raw) {
            Ok(0) => None,
            Ok(_) => {
                if self.raw.last() == Some(&b'\n') {
                    self.raw.pop();
                    if self.raw.last() == Some(&b'\r') {
                        self.raw.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.raw).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Validate, transform and materialize one line.
    fn process(&mut self, line: &str) -> ExtractionResult<Row> {
        // The schema cannot change during an invocation: checking it on the
        // first line covers every later line.
        if !self.schema_checked {
            validate_schema(self.buffer.schema())
                .map_err(|violations| ExtractionError::Schema { violations })?;
            self.schema_checked = true;
        }

        let json = self
            .transformer
            .transform(line)
            .map_err(|e| ExtractionError::transformation(self.line_number, e))?;

        let record = parse_record(&json)
            .map_err(|e| ExtractionError::transformation(self.line_number, e))?;

        fill_row(&record, &mut self.buffer);
        Ok(self.buffer.freeze())
    }
}

impl<R: BufRead, T: LineTransformer> Iterator for Extractor<R, T> {
    type Item = ExtractionResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_none() {
            return None;
        }

        let line = match self.read_line() {
            None => {
                self.release();
                log_success(format!(
                    "{}: extracted {} rows",
                    self.source, self.rows_emitted
                ));
                return None;
            }
            Some(Err(e)) => {
                self.release();
                log_error(format!("{}: read failed after line {}: {}", self.source, self.line_number, e));
                return Some(Err(ExtractionError::Io(e)));
            }
            Some(Ok(line)) => line,
        };

        self.line_number += 1;
        match self.process(&line) {
            Ok(row) => {
                self.rows_emitted += 1;
                Some(Ok(row))
            }
            Err(e) => {
                self.release();
                log_error(format!("{}: {}", self.source, e));
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead, T: LineTransformer> FusedIterator for Extractor<R, T> {}

/// Parse transformer output into a canonical record.
fn parse_record(json: &str) -> Result<CanonicalRecord, TransformationError> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(TransformationError::single(
            "Transformed event is not a JSON object",
        )),
        Err(e) => Err(TransformationError::single(format!(
            "Transformed event is not valid JSON: {}",
            e
        ))),
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Extract enriched events from any buffered reader.
pub fn extract<R: BufRead>(reader: R, schema: Arc<Schema>) -> Extractor<R> {
    Extractor::new(reader, schema)
}

/// Extract from any buffered reader with a custom line transformer.
pub fn extract_with<R: BufRead, T: LineTransformer>(
    reader: R,
    schema: Arc<Schema>,
    transformer: T,
) -> Extractor<R, T> {
    Extractor::with_transformer(reader, schema, transformer)
}

/// Open `path` and extract enriched events from it.
///
/// The file handle lives inside the returned extractor and is closed when the
/// sequence ends or the extractor is dropped.
pub fn extract_file<P: AsRef<Path>>(
    path: P,
    schema: Arc<Schema>,
) -> ExtractionResult<Extractor<BufReader<File>>> {
    extract_file_with(path, schema, EnrichedEventTransformer::default())
}

/// Open `path` and extract with a custom line transformer.
pub fn extract_file_with<P: AsRef<Path>, T: LineTransformer>(
    path: P,
    schema: Arc<Schema>,
    transformer: T,
) -> ExtractionResult<Extractor<BufReader<File>, T>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    Ok(
        Extractor::with_transformer(BufReader::new(file), schema, transformer)
            .with_source(path.display().to_string()),
    )
}

/// Summary of a completed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub source: String,
    pub rows: usize,
}

/// Drain `rows` into `out` as newline-delimited JSON.
///
/// Stops at the first error; rows written before it are kept.
pub fn write_ndjson<I, W>(rows: I, mut out: W) -> ExtractionResult<usize>
where
    I: IntoIterator<Item = ExtractionResult<Row>>,
    W: Write,
{
    let mut written = 0;
    for row in rows {
        let row = row?;
        serde_json::to_writer(&mut out, &row).map_err(std::io::Error::from)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}
