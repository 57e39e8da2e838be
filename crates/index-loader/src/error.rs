//! Error types for the loader library.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::datatype::TypeError;
use crate::schema::SchemaViolation;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for data that could not be read, validated or reshaped.
pub const EXIT_PIPELINE_ERROR: u8 = 2;
/// Exit code for bulk sink failures.
pub const EXIT_SINK_ERROR: u8 = 3;
/// Exit code for a result queue that could not accept an outcome in time.
pub const EXIT_QUEUE_OVERFLOW: u8 = 4;
/// Exit code for dispatches that did not complete in time.
pub const EXIT_TIMEOUT: u8 = 5;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code for a run interrupted by a signal.
pub const EXIT_CANCELLED: u8 = 130;

/// Stage of the page loop at which a pipeline failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Reading documents from the reader.
    Read,
    /// Reshaping documents against the schema.
    Reshape,
    /// Handing the batch to the bulk sink.
    Dispatch,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelinePhase::Read => write!(f, "read"),
            PipelinePhase::Reshape => write!(f, "parsed to be loaded"),
            PipelinePhase::Dispatch => write!(f, "loaded into the index"),
        }
    }
}

/// Main error type for loader operations.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value could not be coerced to its declared semantic type
    #[error(transparent)]
    Type(#[from] TypeError),

    /// One or more mapped fields are missing or mistyped
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// A reader or sink failure, with the source and page it happened at
    #[error("Source {origin}, page {page} could not be {phase}")]
    Pipeline {
        origin: String,
        page: i64,
        phase: PipelinePhase,
        #[source]
        cause: Box<LoadError>,
    },

    /// Documents checked by a dry run did not match the schema
    #[error("{invalid} of {checked} documents failed validation")]
    Validation { invalid: u64, checked: u64 },

    /// A reader broke its paging contract
    #[error("Reader error: {0}")]
    Reader(String),

    /// A bounded result queue stayed full for the whole timeout
    #[error("Result queue is full: outcome for {correlation_id} could not be recorded within {timeout:?}")]
    QueueOverflow {
        correlation_id: String,
        timeout: Duration,
    },

    /// An awaited operation did not finish in time
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    /// Load was cancelled (SIGINT, etc.)
    #[error("Load cancelled")]
    Cancelled,

    /// HTTP transport error talking to the search backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search backend rejected a bulk request
    #[error("Bulk sink error: {0}")]
    Sink(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    /// Wrap an error with the reader source and page it happened at.
    pub fn pipeline(
        origin: impl Into<String>,
        page: i64,
        phase: PipelinePhase,
        cause: LoadError,
    ) -> Self {
        LoadError::Pipeline {
            origin: origin.into(),
            page,
            phase,
            cause: Box::new(cause),
        }
    }

    /// Create a Timeout error
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        LoadError::Timeout {
            what: what.into(),
            after,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            LoadError::Config(_) | LoadError::Yaml(_) => EXIT_CONFIG_ERROR,
            LoadError::Type(_)
            | LoadError::Schema(_)
            | LoadError::Validation { .. }
            | LoadError::Reader(_)
            | LoadError::Json(_) => EXIT_PIPELINE_ERROR,
            LoadError::Pipeline { cause, .. } => match cause.as_ref() {
                LoadError::Http(_) | LoadError::Sink(_) => EXIT_SINK_ERROR,
                LoadError::Io(_) => EXIT_IO_ERROR,
                _ => EXIT_PIPELINE_ERROR,
            },
            LoadError::Http(_) | LoadError::Sink(_) => EXIT_SINK_ERROR,
            LoadError::QueueOverflow { .. } => EXIT_QUEUE_OVERFLOW,
            LoadError::Timeout { .. } => EXIT_TIMEOUT,
            LoadError::Io(_) => EXIT_IO_ERROR,
            LoadError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_message_names_source_and_page() {
        let err = LoadError::pipeline(
            "data/a.json",
            3,
            PipelinePhase::Reshape,
            LoadError::Config("boom".into()),
        );
        assert_eq!(
            err.to_string(),
            "Source data/a.json, page 3 could not be parsed to be loaded"
        );
    }

    #[test]
    fn test_format_detailed_includes_cause_chain() {
        let err = LoadError::pipeline(
            "s",
            0,
            PipelinePhase::Dispatch,
            LoadError::Sink("status 500".into()),
        );
        let detailed = err.format_detailed();
        assert!(detailed.contains("could not be loaded into the index"));
        assert!(detailed.contains("Caused by:\n  1: Bulk sink error: status 500"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(LoadError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(LoadError::Cancelled.exit_code(), EXIT_CANCELLED);
        assert_eq!(
            LoadError::timeout("dispatch", Duration::from_secs(1)).exit_code(),
            EXIT_TIMEOUT
        );
        let wrapped = LoadError::pipeline(
            "s",
            1,
            PipelinePhase::Dispatch,
            LoadError::Sink("rejected".into()),
        );
        assert_eq!(wrapped.exit_code(), EXIT_SINK_ERROR);
        let invalid = LoadError::Validation {
            invalid: 2,
            checked: 10,
        };
        assert_eq!(invalid.to_string(), "2 of 10 documents failed validation");
        assert_eq!(invalid.exit_code(), EXIT_PIPELINE_ERROR);
    }
}
