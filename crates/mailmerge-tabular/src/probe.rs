//! Dialect detection.
//!
//! The source is parsed once per [`Dialect::ALL`] entry (comma, then tab),
//! rewinding in between. Each attempt reads the header row plus a bounded
//! number of look-ahead rows. The attempts are then compared:
//!
//! - both failed: the comma error is returned;
//! - one failed: the survivor is only trusted if the failure was a field
//!   count mismatch and the survivor's header has more than one field;
//! - both succeeded: the wider header wins, ties go to comma.
//!
//! Every row read here is checked against the header width, and a quoted
//! field left open fails the attempt. Bare or extraneous quotes are only
//! reported if they occur in the dialect that wins, since splitting on the
//! wrong delimiter routinely produces them. Rows beyond the look-ahead are checked the same way by the reader
//! as they are pulled.

use std::collections::VecDeque;
use std::io::{Read, Seek, SeekFrom};

use crate::dialect::Dialect;
use crate::error::{Error, ErrorKind, Result};
use crate::rows::Rows;

/// Number of data rows parsed ahead during probing.
pub const DEFAULT_LOOKAHEAD: usize = 100;

/// Outcome of a successful dialect attempt.
#[derive(Debug)]
pub struct Probe {
    dialect: Dialect,
    header: csv::StringRecord,
    rows: VecDeque<csv::StringRecord>,
    resume: u64,
    lines_consumed: u64,
    stray_quote: Option<Error>,
}

impl Probe {
    /// Returns the detected dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the header row.
    #[must_use]
    pub const fn header(&self) -> &csv::StringRecord {
        &self.header
    }

    /// Returns the number of header fields.
    #[must_use]
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Returns the look-ahead rows, oldest first.
    #[must_use]
    pub const fn rows(&self) -> &VecDeque<csv::StringRecord> {
        &self.rows
    }

    /// Absolute offset of the first row not yet parsed.
    #[must_use]
    pub const fn resume_offset(&self) -> u64 {
        self.resume
    }

    /// Number of source lines covered by the header and look-ahead rows.
    #[must_use]
    pub const fn lines_consumed(&self) -> u64 {
        self.lines_consumed
    }

    pub(crate) fn into_parts(self) -> (Dialect, csv::StringRecord, VecDeque<csv::StringRecord>) {
        (self.dialect, self.header, self.rows)
    }
}

/// Detects the dialect of `source`.
///
/// On success the source is positioned at [`Probe::resume_offset`], right
/// after the last look-ahead row.
///
/// # Errors
///
/// Returns [`Error::EndOfInput`] if the source has no header row, a field
/// count mismatch or parse error if no dialect survives, a quoting error
/// found in the winning dialect's rows, or an I/O error if the source cannot
/// be positioned.
pub fn probe<R: Read + Seek>(source: &mut R, lookahead: usize) -> Result<Probe> {
    let start = source.stream_position()?;

    let [comma, tab] = Dialect::ALL.map(|dialect| {
        source.seek(SeekFrom::Start(start))?;
        attempt(&mut *source, dialect, start, lookahead)
    });

    let mut chosen = decide(comma, tab)?;
    if let Some(err) = chosen.stray_quote.take() {
        return Err(err);
    }
    source.seek(SeekFrom::Start(chosen.resume))?;
    Ok(chosen)
}

/// Parses the header and up to `lookahead` rows with one dialect.
fn attempt<R: Read>(source: R, dialect: Dialect, start: u64, lookahead: usize) -> Result<Probe> {
    let mut parser = Rows::new(source, dialect, 0).defer_stray_quotes();

    let mut header = csv::StringRecord::new();
    if !parser.read(&mut header)? {
        return Err(Error::EndOfInput);
    }

    let mut rows = VecDeque::new();
    let mut row = csv::StringRecord::new();
    while rows.len() < lookahead && parser.read(&mut row)? {
        rows.push_back(row.clone());
    }

    // The parser buffers past this point; only its logical position is
    // meaningful to a parser resumed later.
    let position = parser.position().clone();
    Ok(Probe {
        dialect,
        header,
        rows,
        resume: start + position.byte(),
        lines_consumed: position.line().saturating_sub(1),
        stray_quote: parser.take_stray_quote(),
    })
}

fn decide(comma: Result<Probe>, tab: Result<Probe>) -> Result<Probe> {
    match (comma, tab) {
        (Err(err), Err(_)) => Err(err),
        (Ok(comma), Err(err)) => fall_back(comma, err),
        (Err(err), Ok(tab)) => fall_back(tab, err),
        (Ok(comma), Ok(tab)) => {
            if comma.width() >= tab.width() {
                Ok(comma)
            } else {
                Ok(tab)
            }
        }
    }
}

/// Accepts `survivor` only when `failure` was a width mismatch and the
/// survivor actually split its header.
fn fall_back(survivor: Probe, failure: Error) -> Result<Probe> {
    if failure.kind() == ErrorKind::FieldCountMismatch && survivor.width() > 1 {
        Ok(survivor)
    } else {
        Err(failure)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(dialect: Dialect, header: &[&str]) -> Probe {
        Probe {
            dialect,
            header: csv::StringRecord::from(header.to_vec()),
            rows: VecDeque::new(),
            resume: 0,
            lines_consumed: 1,
            stray_quote: None,
        }
    }

    fn mismatch() -> Error {
        Error::FieldCountMismatch {
            line: 2,
            expected: 2,
            found: 3,
        }
    }

    #[test]
    fn test_decide_both_failed_returns_comma_error() {
        let chosen = decide(Err(mismatch()), Err(Error::EndOfInput));
        assert!(chosen.unwrap_err().is_field_count_mismatch());

        let chosen = decide(Err(Error::EndOfInput), Err(mismatch()));
        assert_eq!(chosen.unwrap_err().kind(), ErrorKind::EndOfInput);
    }

    #[test]
    fn test_decide_wider_wins() {
        let chosen = decide(
            Ok(sample(Dialect::Comma, &["a"])),
            Ok(sample(Dialect::Tab, &["a", "b"])),
        );
        assert_eq!(chosen.unwrap().dialect(), Dialect::Tab);
    }

    #[test]
    fn test_decide_tie_prefers_comma() {
        let chosen = decide(
            Ok(sample(Dialect::Comma, &["a", "b"])),
            Ok(sample(Dialect::Tab, &["a", "b"])),
        );
        assert_eq!(chosen.unwrap().dialect(), Dialect::Comma);

        let chosen = decide(
            Ok(sample(Dialect::Comma, &["a"])),
            Ok(sample(Dialect::Tab, &["a"])),
        );
        assert_eq!(chosen.unwrap().dialect(), Dialect::Comma);
    }

    #[test]
    fn test_fall_back_requires_mismatch() {
        let other = Error::from(std::io::Error::other("read failed"));
        let chosen = decide(Ok(sample(Dialect::Comma, &["a", "b"])), Err(other));
        assert_eq!(chosen.unwrap_err().kind(), ErrorKind::Other);
    }

    #[test]
    fn test_fall_back_requires_split_header() {
        let chosen = decide(Err(mismatch()), Ok(sample(Dialect::Tab, &["a,b"])));
        assert!(chosen.unwrap_err().is_field_count_mismatch());

        let chosen = decide(Err(mismatch()), Ok(sample(Dialect::Tab, &["a", "b"])));
        assert_eq!(chosen.unwrap().dialect(), Dialect::Tab);
    }

    #[test]
    fn test_probe_positions_source_after_lookahead() {
        let data = "foo,bar\na,b\nc,d\ne,f\n";
        let mut source = Cursor::new(data.as_bytes());
        let probe = probe(&mut source, 2).unwrap();

        assert_eq!(probe.dialect(), Dialect::Comma);
        assert_eq!(probe.rows().len(), 2);
        assert_eq!(probe.resume_offset(), "foo,bar\na,b\nc,d\n".len() as u64);
        assert_eq!(source.position(), probe.resume_offset());
        assert_eq!(probe.lines_consumed(), 3);
    }

    #[test]
    fn test_probe_respects_start_offset() {
        let data = "preamble\nfoo\tbar\na\tb\n";
        let mut source = Cursor::new(data.as_bytes());
        source.set_position(9);

        let probe = probe(&mut source, DEFAULT_LOOKAHEAD).unwrap();
        assert_eq!(probe.dialect(), Dialect::Tab);
        assert_eq!(probe.resume_offset(), data.len() as u64);
        assert_eq!(probe.header().get(1), Some("bar"));
    }

    #[test]
    fn test_quotes_broken_by_losing_dialect_ignored() {
        // Split on tabs, the quoted comma field has a bare quote.
        let data = "name,note\nAnn,\"hi, there\"\n";
        let mut source = Cursor::new(data.as_bytes());
        let probe = probe(&mut source, DEFAULT_LOOKAHEAD).unwrap();
        assert_eq!(probe.dialect(), Dialect::Comma);
        assert_eq!(probe.rows()[0].get(1), Some("hi, there"));
    }

    #[test]
    fn test_stray_quote_in_chosen_dialect_reported() {
        let mut source = Cursor::new("foo,bar\na,b\"c\n".as_bytes());
        let err = probe(&mut source, DEFAULT_LOOKAHEAD).unwrap_err();
        assert!(matches!(err, Error::BareQuote { line: 2 }));
    }

    #[test]
    fn test_unbounded_lookahead() {
        let mut source = Cursor::new("a,b\n1,2\n".as_bytes());
        let probe = probe(&mut source, usize::MAX).unwrap();
        assert_eq!(probe.rows().len(), 1);
    }

    #[test]
    fn test_probe_empty_is_end_of_input() {
        let mut source = Cursor::new(Vec::<u8>::new());
        let err = probe(&mut source, DEFAULT_LOOKAHEAD).unwrap_err();
        assert!(matches!(err, Error::EndOfInput));
    }
}
