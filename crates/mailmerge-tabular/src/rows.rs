//! Checked record source shared by probing and streaming.

use std::io::Read;

use crate::dialect::Dialect;
use crate::error::{Error, Result, classify};
use crate::quote::{self, Fault};

/// Keeps every byte read from `inner` until the parser has finished the
/// record it belongs to.
#[derive(Debug)]
struct Recorder<R> {
    inner: R,
    buf: Vec<u8>,
    /// Offset of `buf[0]` relative to where reading started.
    base: u64,
}

impl<R> Recorder<R> {
    /// Removes and returns the bytes up to offset `end`.
    fn take(&mut self, end: u64) -> Vec<u8> {
        let len = usize::try_from(end.saturating_sub(self.base))
            .map_or(self.buf.len(), |len| len.min(self.buf.len()));
        self.base += len as u64;
        self.buf.drain(..len).collect()
    }
}

impl<R: Read> Read for Recorder<R> {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(out)?;
        self.buf.extend_from_slice(&out[..n]);
        Ok(n)
    }
}

/// Rows of one dialect, each checked for strict quoting and, once the
/// width is known, for field count.
///
/// The first row read fixes the width unless one was given up front.
/// Bare and extraneous quotes can be held back instead of failing the read;
/// an unterminated quote always fails it.
#[derive(Debug)]
pub(crate) struct Rows<R> {
    dialect: Dialect,
    parser: csv::Reader<Recorder<R>>,
    width: Option<usize>,
    line_offset: u64,
    defer_stray_quotes: bool,
    stray_quote: Option<Error>,
}

impl<R: Read> Rows<R> {
    /// Starts reading `source` at its current position. `line_offset` lines
    /// are taken to precede it.
    pub(crate) fn new(source: R, dialect: Dialect, line_offset: u64) -> Self {
        let recorder = Recorder {
            inner: source,
            buf: Vec::new(),
            base: 0,
        };
        Self {
            dialect,
            parser: dialect.parser(recorder),
            width: None,
            line_offset,
            defer_stray_quotes: false,
            stray_quote: None,
        }
    }

    /// Requires every row to have `width` fields.
    pub(crate) fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Records the first bare or extraneous quote instead of failing on it.
    ///
    /// Such quotes are often artifacts of splitting on the wrong delimiter,
    /// so they only matter once the dialect has been chosen.
    pub(crate) fn defer_stray_quotes(mut self) -> Self {
        self.defer_stray_quotes = true;
        self
    }

    /// Returns the first held-back quote error, if any.
    pub(crate) fn take_stray_quote(&mut self) -> Option<Error> {
        self.stray_quote.take()
    }

    /// Reads the next row into `record`. Returns `false` at end of input.
    pub(crate) fn read(&mut self, record: &mut csv::StringRecord) -> Result<bool> {
        if !self
            .parser
            .read_record(record)
            .map_err(|err| classify(err, self.line_offset))?
        {
            return Ok(false);
        }

        let line = record.position().map_or(0, csv::Position::line) + self.line_offset;
        let end = self.parser.position().byte();
        let raw = self.parser.get_mut().take(end);
        match quote::check(&raw, self.dialect.delimiter()) {
            Ok(()) => {}
            Err(fault) if self.defer_stray_quotes && fault != Fault::Unterminated => {
                if self.stray_quote.is_none() {
                    self.stray_quote = Some(fault.at(line));
                }
            }
            Err(fault) => return Err(fault.at(line)),
        }

        match self.width {
            None => self.width = Some(record.len()),
            Some(width) if width != record.len() => {
                return Err(Error::FieldCountMismatch {
                    line,
                    expected: width as u64,
                    found: record.len() as u64,
                });
            }
            Some(_) => {}
        }
        Ok(true)
    }

    /// Logical position after the last row read, relative to where
    /// reading started.
    pub(crate) fn position(&self) -> &csv::Position {
        self.parser.position()
    }

    /// Returns the underlying source.
    pub(crate) fn into_inner(self) -> R {
        self.parser.into_inner().inner
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn read_all(data: &str, dialect: Dialect) -> Result<Vec<Vec<String>>> {
        let mut rows = Rows::new(data.as_bytes(), dialect, 0);
        let mut record = csv::StringRecord::new();
        let mut out = Vec::new();
        while rows.read(&mut record)? {
            out.push(record.iter().map(str::to_owned).collect());
        }
        Ok(out)
    }

    #[test]
    fn test_first_row_fixes_width() {
        let err = read_all("a,b\nc,d\ne\n", Dialect::Comma).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldCountMismatch {
                line: 3,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_quoted_fields_span_lines() {
        let rows = read_all("a,b\n\"x\ny\",\"1,2\"\n", Dialect::Comma).unwrap();
        assert_eq!(rows[1], ["x\ny", "1,2"]);
    }

    #[test]
    fn test_quote_checked_per_record() {
        let err = read_all("a,b\nc,d\ne,\"f\n", Dialect::Comma).unwrap_err();
        assert!(matches!(err, Error::UnterminatedQuote { line: 3 }));
    }

    #[test]
    fn test_quote_checked_before_width() {
        let err = read_all("a,b\n\"c,d\n", Dialect::Comma).unwrap_err();
        assert!(matches!(err, Error::UnterminatedQuote { line: 2 }));
    }

    #[test]
    fn test_stray_quotes_fail_by_default() {
        let err = read_all("a,b\nc,d\"e\n", Dialect::Comma).unwrap_err();
        assert!(matches!(err, Error::BareQuote { line: 2 }));
    }

    #[test]
    fn test_stray_quotes_deferred() {
        let mut rows =
            Rows::new(&b"a,b\nc,d\"e\nf,\"g\"h\n"[..], Dialect::Comma, 0).defer_stray_quotes();
        let mut record = csv::StringRecord::new();
        while rows.read(&mut record).unwrap() {}
        assert!(matches!(
            rows.take_stray_quote(),
            Some(Error::BareQuote { line: 2 })
        ));
        assert!(rows.take_stray_quote().is_none());
    }

    #[test]
    fn test_unterminated_quote_never_deferred() {
        let mut rows = Rows::new(&b"a,b\nc,\"d\n"[..], Dialect::Comma, 0).defer_stray_quotes();
        let mut record = csv::StringRecord::new();
        assert!(rows.read(&mut record).unwrap());
        assert!(matches!(
            rows.read(&mut record),
            Err(Error::UnterminatedQuote { line: 2 })
        ));
    }

    #[test]
    fn test_given_width_and_line_offset() {
        let mut rows = Rows::new(&b"1,2,3\n"[..], Dialect::Comma, 10).with_width(2);
        let mut record = csv::StringRecord::new();
        let err = rows.read(&mut record).unwrap_err();
        assert!(matches!(err, Error::FieldCountMismatch { line: 11, .. }));
    }

    #[test]
    fn test_recorder_drains_consumed_bytes() {
        let mut rows = Rows::new(&b"a,b\nc,d\n"[..], Dialect::Comma, 0);
        let mut record = csv::StringRecord::new();
        assert!(rows.read(&mut record).unwrap());
        assert_eq!(rows.parser.get_ref().base, 4);
        assert_eq!(rows.parser.get_ref().buf, b"c,d\n");
    }
}
