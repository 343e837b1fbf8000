//! Error types for tabular input.

/// Result type alias for tabular operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Dialect probing only treats [`ErrorKind::FieldCountMismatch`] as a
/// tie-break signal; everything in [`ErrorKind::Other`] is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source had no header row.
    EndOfInput,
    /// A row's field count disagrees with the header's.
    FieldCountMismatch,
    /// I/O failure or any other structural parse failure.
    Other,
}

/// Tabular input error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source contained no header row at all.
    #[error("Input is empty: no header row")]
    EndOfInput,

    /// A row has a different number of fields than the header.
    #[error("Field count mismatch on line {line}: expected {expected} fields, found {found}")]
    FieldCountMismatch {
        /// 1-based line on which the offending row starts.
        line: u64,
        /// Field count of the header row.
        expected: u64,
        /// Field count of the offending row.
        found: u64,
    },

    /// A quoted field is still open at the end of the input.
    #[error("Unterminated quoted field in record starting on line {line}")]
    UnterminatedQuote {
        /// 1-based line on which the record starts.
        line: u64,
    },

    /// A closing quote is followed by something other than a delimiter or
    /// line end.
    #[error("Extraneous quote in quoted field in record starting on line {line}")]
    ExtraneousQuote {
        /// 1-based line on which the record starts.
        line: u64,
    },

    /// A quote appears inside a field that did not start with one.
    #[error("Bare quote in unquoted field in record starting on line {line}")]
    BareQuote {
        /// 1-based line on which the record starts.
        line: u64,
    },

    /// A field is not valid UTF-8.
    #[error("Invalid UTF-8 in field {field} on line {line}")]
    Utf8 {
        /// 1-based line on which the record starts.
        line: u64,
        /// 0-based index of the offending field.
        field: usize,
    },

    /// Any other failure reported by the delimited parser.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error while reading or positioning the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EndOfInput => ErrorKind::EndOfInput,
            Self::FieldCountMismatch { .. } => ErrorKind::FieldCountMismatch,
            Self::UnterminatedQuote { .. }
            | Self::ExtraneousQuote { .. }
            | Self::BareQuote { .. }
            | Self::Utf8 { .. }
            | Self::Parse(_)
            | Self::Io(_) => ErrorKind::Other,
        }
    }

    /// Returns true if this is a field count mismatch.
    #[must_use]
    pub const fn is_field_count_mismatch(&self) -> bool {
        matches!(self.kind(), ErrorKind::FieldCountMismatch)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        classify(err, 0)
    }
}

/// Maps a parser error onto the tabular taxonomy.
///
/// `line_offset` is added to the parser's line numbers for parsers that were
/// started part way through the source.
pub(crate) fn classify(err: csv::Error, line_offset: u64) -> Error {
    let line = |pos: Option<&csv::Position>| pos.map_or(0, csv::Position::line) + line_offset;
    let message = err.to_string();

    match err.into_kind() {
        csv::ErrorKind::Io(err) => Error::Io(err),
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Error::FieldCountMismatch {
            line: line(pos.as_ref()),
            expected: expected_len,
            found: len,
        },
        csv::ErrorKind::Utf8 { pos, err } => Error::Utf8 {
            line: line(pos.as_ref()),
            field: err.field(),
        },
        _ => Error::Parse(message),
    }
}
