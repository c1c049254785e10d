//! Error types for schedkit.
//!
//! Library crates use [`SchedKitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all schedkit operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedKitError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while crawling the schedule site.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or row extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A raw field could not be coerced to its expected type.
    #[error("input format error in record {record}: field `{field}` has invalid value {value:?}")]
    InputFormat {
        record: String,
        field: String,
        value: String,
    },

    /// An input path does not exist.
    #[error("missing input file: {path:?}")]
    MissingFile { path: PathBuf },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON (de)serialization error for a specific file.
    #[error("JSON error at {path:?}: {message}")]
    Json { path: PathBuf, message: String },

    /// Cross-reference or uniqueness invariant violated.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SchedKitError>;

impl SchedKitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an input-format error for one field of one record.
    pub fn input_format(
        record: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InputFormat {
            record: record.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `serde_json::Error` with a path for context.
    pub fn json(path: impl Into<PathBuf>, err: &serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SchedKitError::config("bad table path");
        assert_eq!(err.to_string(), "config error: bad table path");

        let err = SchedKitError::input_format("crn 10234", "cap", "ten");
        assert_eq!(
            err.to_string(),
            "input format error in record crn 10234: field `cap` has invalid value \"ten\""
        );
    }

    #[test]
    fn missing_file_names_path() {
        let err = SchedKitError::MissingFile {
            path: PathBuf::from("/no/such/raw.json"),
        };
        assert!(err.to_string().contains("/no/such/raw.json"));
    }
}
