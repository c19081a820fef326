//! Custom error types for schema deduction.
//!
//! Per-record problems never surface here: unknown fields, mismatched
//! sub-values and missing coordinates are skipped during the scan. The
//! variants below cover the input contract (the corpus must be a sequence of
//! mappings), strict-mode timestamp rejection, configuration and the
//! reduction engine.
//!
//! Errors are serializable so that they can be returned as JSON alongside a
//! schema.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for schema deduction.
#[derive(Error, Debug)]
pub enum DeduceError {
    /// The corpus as a whole is not a sequence of records.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single element of the corpus is not a mapping.
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// A `time` field could not be parsed and strict timestamps are enabled.
    #[error("Unparseable timestamp at record {index}: {value}")]
    InvalidTimestamp { index: usize, value: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A reducer could not be evaluated.
    #[error("Failed to reduce '{group}': {reason}")]
    ReductionFailed { group: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DeduceError>,
    },
}

impl DeduceError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DeduceError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidRecord { .. } => "INVALID_RECORD",
            Self::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ReductionFailed { .. } => "REDUCTION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a violation of the input contract.
    ///
    /// These are raised before any record is scanned.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::InvalidRecord { .. } => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for DeduceError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DeduceError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<crate::config::ConfigValidationError> for DeduceError {
    fn from(e: crate::config::ConfigValidationError) -> Self {
        DeduceError::InvalidConfig(e.to_string())
    }
}

/// Result type alias for deduction operations.
pub type Result<T> = std::result::Result<T, DeduceError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DeduceError::Polars(e).with_context(context))
    }
}
