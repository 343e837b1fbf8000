//! Server replies.
//!
//! Replies are single-line (`250 OK`) or multi-line, where every line but
//! the last separates the code from the text with `-`:
//!
//! ```text
//! 250-smtp.example.com
//! 250-STARTTLS
//! 250 AUTH PLAIN LOGIN
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// Three digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code.
    pub code: ReplyCode,
    /// Text of each line, without the code.
    pub lines: Vec<String>,
}

impl Reply {
    /// Parses the lines of one reply, already split and without CRLF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a line is malformed or the lines carry
    /// different codes.
    pub fn parse(lines: &[String]) -> Result<Self> {
        let Some(first) = lines.first() else {
            return Err(Error::Protocol("Empty reply".into()));
        };
        let code = code_of(first)?;

        let mut text = Vec::with_capacity(lines.len());
        for line in lines {
            if code_of(line)? != code {
                return Err(Error::Protocol(format!("Mixed reply codes: {line}")));
            }
            text.push(line.get(4..).unwrap_or_default().to_string());
        }

        Ok(Self { code, lines: text })
    }

    /// Returns true for 2xx replies.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the reply text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts a reply with an unexpected code into an error.
    pub(crate) fn into_error(self) -> Error {
        Error::rejected(self.code.as_u16(), self.text())
    }
}

fn code_of(line: &str) -> Result<ReplyCode> {
    let code = line
        .get(..3)
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("Malformed reply line: {line}")))?;

    match line.as_bytes().get(3) {
        None | Some(b' ' | b'-') => Ok(ReplyCode::new(code)),
        Some(_) => Err(Error::Protocol(format!("Malformed reply line: {line}"))),
    }
}

/// Checks if a line ends a reply.
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    line.as_bytes().get(3) != Some(&b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_single_line() {
        let reply = Reply::parse(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, ["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_multi_line() {
        let reply = Reply::parse(&lines(&["250-mx.example.com", "250-STARTTLS", "250 SIZE 100"]))
            .unwrap();
        assert_eq!(reply.lines, ["mx.example.com", "STARTTLS", "SIZE 100"]);
        assert_eq!(reply.text(), "mx.example.com\nSTARTTLS\nSIZE 100");
    }

    #[test]
    fn test_bare_code() {
        let reply = Reply::parse(&lines(&["354"])).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.lines, [""]);
    }

    #[test]
    fn test_malformed() {
        assert!(Reply::parse(&[]).is_err());
        assert!(Reply::parse(&lines(&["25"])).is_err());
        assert!(Reply::parse(&lines(&["ABC OK"])).is_err());
        assert!(Reply::parse(&lines(&["250xOK"])).is_err());
        assert!(Reply::parse(&lines(&["250-a", "251 b"])).is_err());
    }

    #[test]
    fn test_is_last_line() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-more"));
    }

    #[test]
    fn test_into_error() {
        let err = Reply::parse(&lines(&["550 no such user"])).unwrap().into_error();
        assert!(err.is_permanent());
        assert!(err.to_string().contains("no such user"));
    }
}
