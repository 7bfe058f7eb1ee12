//! Error types for the extraction pipeline.
//!
//! Every failure the extractor can report lives here:
//!
//! - [`SchemaViolation`] - One column of a requested schema that the catalog rejects
//! - [`TransformationError`] - A raw line the line transformer could not convert
//! - [`ExtractionError`] - Top-level, aggregated error yielded by the pipeline
//! - [`SchemaFileError`] - Errors loading a schema file
//! - [`TypeParseError`] - Unparseable column type in a schema file
//!
//! Both fatal pipeline failures carry the complete diagnostic list (all
//! violations, or all transformer messages) rather than the first cause.

use thiserror::Error;

use crate::models::ColumnType;

// =============================================================================
// Schema Violations
// =============================================================================

/// A single column of a requested schema that does not conform to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// Column is known but declared with the wrong type.
    #[error("Invalid columnType {actual} for columnName {column}; expected columnType: {expected}")]
    TypeMismatch {
        column: String,
        actual: ColumnType,
        expected: ColumnType,
    },

    /// Column is neither in the catalog nor part of a dynamic family.
    #[error("Invalid columnName {column}")]
    UnrecognizedColumn { column: String },
}

impl SchemaViolation {
    /// Name of the offending column.
    pub fn column(&self) -> &str {
        match self {
            SchemaViolation::TypeMismatch { column, .. } => column,
            SchemaViolation::UnrecognizedColumn { column } => column,
        }
    }
}

// =============================================================================
// Line Transformation Errors
// =============================================================================

/// A raw line rejected by the line transformer.
///
/// Always carries at least one message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("; "))]
pub struct TransformationError {
    messages: Vec<String>,
}

impl TransformationError {
    /// An empty list is replaced by a generic message.
    pub fn new(messages: Vec<String>) -> Self {
        if messages.is_empty() {
            return Self::single("Line could not be transformed");
        }
        Self { messages }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Reported messages, never empty.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

// =============================================================================
// Extraction Errors (top-level)
// =============================================================================

/// Structured kind of an [`ExtractionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Transformation,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Schema => "schema validation failed",
            ErrorKind::Transformation => "line transformation failed",
            ErrorKind::Io => "input could not be read",
        };
        f.write_str(name)
    }
}

/// Errors yielded by the extraction pipeline.
///
/// Any of these ends the invocation; rows yielded before it stay valid.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The requested schema does not conform to the catalog.
    #[error("Schema validation failed: {}", join_violations(.violations))]
    Schema { violations: Vec<SchemaViolation> },

    /// The line transformer rejected an input line.
    #[error("Failed to transform line {line}: {}", .messages.join("; "))]
    Transformation { line: usize, messages: Vec<String> },

    /// The input stream could not be read.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn transformation(line: usize, source: TransformationError) -> Self {
        ExtractionError::Transformation {
            line,
            messages: source.into_messages(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::Schema { .. } => ErrorKind::Schema,
            ExtractionError::Transformation { .. } => ErrorKind::Transformation,
            ExtractionError::Io(_) => ErrorKind::Io,
        }
    }

    /// Every diagnostic message carried by this error, in order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ExtractionError::Schema { violations } => {
                violations.iter().map(|v| v.to_string()).collect()
            }
            ExtractionError::Transformation { messages, .. } => messages.clone(),
            ExtractionError::Io(e) => vec![e.to_string()],
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Schema File Errors
// =============================================================================

/// Unparseable column type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown column type '{0}'")]
pub struct TypeParseError(pub String);

/// Errors while loading a schema file.
#[derive(Debug, Error)]
pub enum SchemaFileError {
    /// Failed to read file.
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Not a JSON array of column definitions.
    #[error("Invalid schema JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A column declares an unknown type.
    #[error("Invalid type for column '{column}': {source}")]
    InvalidType {
        column: String,
        #[source]
        source: TypeParseError,
    },

    /// A default value cannot be represented as the column type.
    #[error("Default value {value} is not a valid {column_type} for column '{column}'")]
    InvalidDefault {
        column: String,
        column_type: ColumnType,
        value: String,
    },

    /// The schema has no columns.
    #[error("Schema has no columns")]
    Empty,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pipeline operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Result type for line transformation.
pub type TransformationResult<T> = Result<T, TransformationError>;

/// Result type for schema file loading.
pub type SchemaFileResult<T> = Result<T, SchemaFileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemanticType;

    #[test]
    fn test_violation_format() {
        let err = SchemaViolation::TypeMismatch {
            column: "pp_xoffset_min".into(),
            actual: ColumnType::nullable(SemanticType::String),
            expected: ColumnType::nullable(SemanticType::Int32),
        };
        assert_eq!(
            err.to_string(),
            "Invalid columnType string for columnName pp_xoffset_min; expected columnType: int32?"
        );

        let err = SchemaViolation::UnrecognizedColumn {
            column: "unknown_field".into(),
        };
        assert_eq!(err.to_string(), "Invalid columnName unknown_field");
    }

    #[test]
    fn test_schema_error_carries_every_violation() {
        let err = ExtractionError::Schema {
            violations: vec![
                SchemaViolation::UnrecognizedColumn { column: "a".into() },
                SchemaViolation::UnrecognizedColumn { column: "b".into() },
            ],
        };
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.messages().len(), 2);
        let msg = err.to_string();
        assert!(msg.contains("Invalid columnName a"));
        assert!(msg.contains("Invalid columnName b"));
    }

    #[test]
    fn test_transformation_error_keeps_messages_verbatim() {
        let source = TransformationError::new(vec![
            "Expected 131 fields, received 3 fields.".into(),
        ]);
        let err = ExtractionError::transformation(2, source);
        assert_eq!(err.kind(), ErrorKind::Transformation);
        assert_eq!(err.messages(), vec!["Expected 131 fields, received 3 fields."]);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err: ExtractionError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_transformation_error_is_never_empty() {
        let err = TransformationError::new(Vec::new());
        assert_eq!(err.messages().len(), 1);
        assert!(!err.to_string().is_empty());

        let err = ExtractionError::transformation(4, TransformationError::new(Vec::new()));
        assert_eq!(err.messages(), vec!["Line could not be transformed"]);
    }
}
