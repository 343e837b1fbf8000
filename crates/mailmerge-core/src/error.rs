//! Error types for the merge pipeline.

use thiserror::Error;

/// Errors that can occur while merging.
#[derive(Debug, Error)]
pub enum Error {
    /// Tabular input could not be read.
    #[error("Input error: {0}")]
    Tabular(#[from] mailmerge_tabular::Error),

    /// Rendered message is not valid.
    #[error("Message error: {0}")]
    Mime(#[from] mailmerge_mime::Error),

    /// SMTP submission failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] mailmerge_smtp::Error),

    /// Template text could not be parsed.
    #[error("Template error on line {line}: {message}")]
    Template {
        /// 1-based line within the template section.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Template references a name with no value.
    #[error("No value for template field: {0}")]
    MissingValue(String),

    /// Template references names that neither the input nor the overrides
    /// provide.
    #[error("Template fields not found in input columns or overrides: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    /// Override was not in `key=value` form.
    #[error("Invalid named value [{0}], expected key=value")]
    InvalidNamedValue(String),

    /// A single row failed to merge.
    #[error("Row {row}: {source}")]
    Row {
        /// 1-based data row number.
        row: usize,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
