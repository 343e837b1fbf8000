//! Header-keyed streaming reader.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Seek};

use crate::dialect::Dialect;
use crate::error::Result;
use crate::probe::{DEFAULT_LOOKAHEAD, probe};
use crate::rows::Rows;

/// One input row keyed by header name.
///
/// Duplicate header names keep the value of the rightmost column.
pub type Record = HashMap<String, String>;

/// Pull-based reader over comma or tab separated input.
///
/// Construction detects the dialect and pre-parses a bounded number of rows.
/// Those rows are delivered first; afterwards rows come straight from the
/// underlying parser and are checked for quoting and against the header
/// width as they arrive.
#[derive(Debug)]
pub struct TabularReader<R> {
    dialect: Dialect,
    header: Vec<String>,
    lookahead: VecDeque<csv::StringRecord>,
    rows: Rows<R>,
    row: csv::StringRecord,
    finished: bool,
}

impl<R: Read + Seek> TabularReader<R> {
    /// Creates a reader with the default look-ahead.
    ///
    /// # Errors
    ///
    /// Returns an error if no dialect yields a usable parse. Empty input is
    /// reported as [`crate::Error::EndOfInput`].
    pub fn new(source: R) -> Result<Self> {
        Self::with_lookahead(source, DEFAULT_LOOKAHEAD)
    }

    /// Creates a reader that pre-parses up to `lookahead` rows while
    /// detecting the dialect.
    ///
    /// # Errors
    ///
    /// Same as [`TabularReader::new`].
    pub fn with_lookahead(mut source: R, lookahead: usize) -> Result<Self> {
        let probe = probe(&mut source, lookahead)?;
        let line_offset = probe.lines_consumed();
        let (dialect, header, lookahead) = probe.into_parts();

        Ok(Self {
            dialect,
            rows: Rows::new(source, dialect, line_offset).with_width(header.len()),
            header: header.iter().map(str::to_owned).collect(),
            lookahead,
            row: csv::StringRecord::new(),
            finished: false,
        })
    }
}

impl<R: Read> TabularReader<R> {
    /// Returns the detected dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the header field names in column order.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` at end of stream, and on every call after that. A
    /// failed call yields no record and finishes the stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FieldCountMismatch`] if a row's width differs
    /// from the header's, a quoting error for malformed quoted fields, or a
    /// parse or I/O error from the underlying parser.
    pub fn read(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }

        if let Some(row) = self.lookahead.pop_front() {
            return Ok(Some(self.to_record(&row)));
        }

        match self.rows.read(&mut self.row) {
            Ok(true) => Ok(Some(self.to_record(&self.row))),
            Ok(false) => {
                self.finished = true;
                Ok(None)
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.rows.into_inner()
    }

    fn to_record(&self, row: &csv::StringRecord) -> Record {
        self.header
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), value.to_owned()))
            .collect()
    }
}

impl<R: Read> Iterator for TabularReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Cursor;

    fn reader(data: &str) -> TabularReader<Cursor<Vec<u8>>> {
        TabularReader::new(Cursor::new(data.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_header_in_column_order() {
        let r = reader("b,a,c\n1,2,3\n");
        assert_eq!(r.header(), ["b", "a", "c"]);
        assert_eq!(r.dialect(), Dialect::Comma);
    }

    #[test]
    fn test_duplicate_header_keeps_last_column() {
        let mut r = reader("name,name\nfirst,second\n");
        let record = r.read().unwrap().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["name"], "second");
    }

    #[test]
    fn test_rows_past_lookahead() {
        let mut r = TabularReader::with_lookahead(
            Cursor::new(b"k,v\n1,a\n2,b\n3,c\n".to_vec()),
            1,
        )
        .unwrap();

        let keys: Vec<String> = (&mut r)
            .map(|record| record.unwrap()["k"].clone())
            .collect();
        assert_eq!(keys, ["1", "2", "3"]);
        assert!(r.read().unwrap().is_none());
    }

    #[test]
    fn test_tail_width_violation_is_fatal() {
        let mut r = TabularReader::with_lookahead(
            Cursor::new(b"k,v\n1,a\n2,b,extra\n3,c\n".to_vec()),
            1,
        )
        .unwrap();

        assert_eq!(r.read().unwrap().unwrap()["v"], "a");
        match r.read().unwrap_err() {
            Error::FieldCountMismatch {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(r.read().unwrap().is_none());
    }

    #[test]
    fn test_quoted_field_spanning_lines() {
        let mut r = reader("to,body\nann@example.com,\"line one\nline two, with comma\"\n");
        let record = r.read().unwrap().unwrap();
        assert_eq!(record["body"], "line one\nline two, with comma");
        assert!(r.read().unwrap().is_none());
    }

    #[test]
    fn test_into_inner_returns_source() {
        let r = reader("a,b\n1,2\n");
        let source = r.into_inner();
        assert_eq!(source.get_ref().len(), 8);
    }
}
