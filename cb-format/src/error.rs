//! Error types for the Compact Binary format

use thiserror::Error;

/// Error recorded on a field view by its typed accessors.
///
/// Accessors never fail loudly: they return a default value and leave one of
/// these on the field until the next access overwrites it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// The field does not hold the requested type.
    #[error("field type does not match the requested type")]
    Type,
    /// The value decodes but does not fit the requested numeric width.
    #[error("field value is out of range for the requested type")]
    Range,
    /// The payload is malformed for its type, e.g. a string that is not UTF-8.
    #[error("field payload is malformed")]
    Format,
}

/// Compact Binary error types
#[derive(Debug, Error)]
pub enum CbError {
    /// Input ended before the declared extent of a field or record.
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Encountered a type code outside the defined tag space.
    #[error("Invalid field type: {0:#04x}")]
    InvalidFieldType(u8),
    /// A configured limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// The builder rejected a field or scope at the current position.
    #[error("Placement error: {0}")]
    Placement(String),
    /// Package header, directory or root attachment is malformed.
    #[error("Format error: {0}")]
    Format(String),
    /// Structural validation found a defect.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// A typed read of a field failed.
    #[error("Field access failed: {0}")]
    Field(#[from] FieldError),
    /// Text could not be parsed into a value type.
    #[error("Parse error: {0}")]
    Parse(String),
    /// I/O operation failed while reading or writing data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CbError>;
