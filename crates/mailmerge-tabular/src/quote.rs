//! Quote validation over the raw bytes of one record.
//!
//! The delimited parser is lenient: it takes a quote inside an unquoted
//! field as data and reads an open quoted field through to the end of the
//! input. Strict quoting is enforced here instead, on the bytes the parser
//! consumed for each record.

use crate::error::Error;

/// A quoting rule broken by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Quote inside a field that did not start with one.
    Bare,
    /// Closing quote followed by something other than a delimiter or line
    /// end.
    Extraneous,
    /// Quoted field still open when the record ended.
    Unterminated,
}

impl Fault {
    /// Converts the fault into an error for the record starting on `line`.
    pub(crate) const fn at(self, line: u64) -> Error {
        match self {
            Self::Bare => Error::BareQuote { line },
            Self::Extraneous => Error::ExtraneousQuote { line },
            Self::Unterminated => Error::UnterminatedQuote { line },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// A quote seen inside a quoted field: either an escaped quote or the
    /// closing one.
    QuoteInQuoted,
}

/// Checks the quoting of one record's raw bytes.
///
/// `raw` may carry line terminators or blank lines around the record.
pub(crate) fn check(raw: &[u8], delimiter: u8) -> Result<(), Fault> {
    let mut state = State::FieldStart;

    for &byte in raw {
        state = match (state, byte) {
            (State::FieldStart | State::QuoteInQuoted, b'"') => State::Quoted,
            (State::Quoted, b'"') => State::QuoteInQuoted,
            (State::Quoted, _) => State::Quoted,
            (State::Unquoted, b'"') => return Err(Fault::Bare),
            (_, b'\r' | b'\n') => State::FieldStart,
            (_, b) if b == delimiter => State::FieldStart,
            (State::QuoteInQuoted, _) => return Err(Fault::Extraneous),
            (State::FieldStart | State::Unquoted, _) => State::Unquoted,
        };
    }

    if state == State::Quoted {
        Err(Fault::Unterminated)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comma(raw: &str) -> Result<(), Fault> {
        check(raw.as_bytes(), b',')
    }

    #[test]
    fn test_plain_and_quoted_fields() {
        assert!(comma("a,b\n").is_ok());
        assert!(comma("\"a,b\",c\r\n").is_ok());
        assert!(comma("\"say \"\"hi\"\"\",b\n").is_ok());
        assert!(comma("\"two\nlines\",b\n").is_ok());
        assert!(comma("\"\",\"\"\n").is_ok());
        assert!(comma("\na,b").is_ok());
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(comma("a,\"b\n"), Err(Fault::Unterminated));
        assert_eq!(comma("\"a,b\n"), Err(Fault::Unterminated));
    }

    #[test]
    fn test_bare_quote() {
        assert_eq!(comma("a,b\"c\n"), Err(Fault::Bare));
        assert_eq!(comma("ab\",c\n"), Err(Fault::Bare));
    }

    #[test]
    fn test_extraneous_quote() {
        assert_eq!(comma("\"a\"b,c\n"), Err(Fault::Extraneous));
    }

    #[test]
    fn test_delimiter_is_per_dialect() {
        // With tabs as delimiter the comma is data, so the quote is bare.
        assert_eq!(check(b"a,\"b\"\n", b'\t'), Err(Fault::Bare));
        assert!(check(b"a\t\"b,c\"\n", b'\t').is_ok());
    }

    #[test]
    fn test_fault_line() {
        assert!(matches!(
            Fault::Unterminated.at(7),
            Error::UnterminatedQuote { line: 7 }
        ));
        assert!(matches!(Fault::Bare.at(2), Error::BareQuote { line: 2 }));
    }
}
