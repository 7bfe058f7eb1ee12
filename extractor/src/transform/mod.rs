//! Transformation module.
//!
//! This module turns raw enriched-event lines into typed rows:
//! - Enriched: TSV line to canonical JSON record (shredding contexts)
//! - Coerce: JSON value to typed field value
//! - Materialize: canonical record to schema-ordered row
//! - Pipeline: lazy, fail-fast extraction over a reader

pub mod coerce;
pub mod enriched;
pub mod materialize;
pub mod pipeline;

pub use coerce::coerce;
pub use enriched::{fix_schema, EnrichedEventTransformer, LineTransformer, ENRICHED_EVENT_FIELD_COUNT};
pub use materialize::{column_value, fill_row, materialize, CanonicalRecord};
pub use pipeline::*;
