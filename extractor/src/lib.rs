//! # Snowplow Extractor - enriched-event TSV to schema-typed rows
//!
//! The extractor reads Snowplow enriched-event TSV (131 tab-separated fields
//! per line), checks a caller-supplied column schema against the catalog of
//! known fields, and lazily yields one typed row per line.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  TSV lines  │────▶│  Validate   │────▶│  Transform  │────▶│ Materialize │────▶ Row
//! │  (reader)   │     │  (catalog)  │     │ (canonical) │     │  (schema)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snowplow_extractor::{extract_file, Schema};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Arc::new(Schema::load("schema.json")?);
//!     for row in extract_file("events.tsv", schema)? {
//!         println!("{}", serde_json::to_string(&row?)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Semantic types, field values, rows
//! - [`schema`] - Requested column schemas and schema files
//! - [`catalog`] - Known enriched-event fields and their types
//! - [`validation`] - Schema validation against the catalog
//! - [`transform`] - Line transformer, coercion, materialization, pipeline
//! - [`config`] - Extraction options
//! - [`logs`] - Diagnostic logging

// Core modules
pub mod error;
pub mod models;

// Schemas
pub mod catalog;
pub mod schema;
pub mod validation;

// Extraction
pub mod transform;

// Ambient
pub mod config;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ErrorKind,
    ExtractionError,
    ExtractionResult,
    SchemaFileError,
    SchemaViolation,
    TransformationError,
    TransformationResult,
    TypeParseError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ColumnType, FieldValue, Row, RowBuffer, SemanticType};

// =============================================================================
// Re-exports - Schema & Validation
// =============================================================================

pub use schema::{ColumnSpec, Schema};

pub use validation::{check_column, is_valid_schema, schema_violations, validate_schema};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    coerce,
    materialize,
    EnrichedEventTransformer,
    LineTransformer,
    ENRICHED_EVENT_FIELD_COUNT,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    extract,
    extract_with,
    extract_file,
    extract_file_with,
    write_ndjson,
    ExtractionSummary,
    Extractor,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::ExtractOptions;
