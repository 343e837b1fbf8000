//! Supported tabular dialects.

use std::fmt;

/// Single-character field delimiter convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Comma separated values.
    Comma,
    /// Tab separated values.
    Tab,
}

impl Dialect {
    /// Dialects in probing order. Earlier entries win ties.
    pub const ALL: [Self; 2] = [Self::Comma, Self::Tab];

    /// Returns the delimiter byte.
    #[must_use]
    pub const fn delimiter(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }

    /// Builds a parser for this dialect over `source`.
    ///
    /// The first row is returned like any other and rows of any width are
    /// accepted; header and width handling happen in the caller.
    pub(crate) fn parser<R: std::io::Read>(self, source: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter())
            .has_headers(false)
            .flexible(true)
            .from_reader(source)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comma => write!(f, "comma"),
            Self::Tab => write!(f, "tab"),
        }
    }
}
