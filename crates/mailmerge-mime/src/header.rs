//! Message header handling.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of email headers.
///
/// Lookups are case-insensitive; names keep the case they were added with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The header keeps the position of its first occurrence.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => {
                self.entries[idx].1 = value;
                let mut seen = 0;
                self.entries.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///   folded continuation
    /// ```
    ///
    /// Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a header nor a continuation, or
    /// a header name is empty or contains whitespace.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                break;
            }

            // Continuation line (starts with space or tab)
            if line.starts_with(' ') || line.starts_with('\t') {
                let Some((_, value)) = headers.entries.last_mut() else {
                    return Err(Error::InvalidHeader(format!(
                        "Continuation without header: {line}"
                    )));
                };
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::InvalidHeader(format!("Missing colon: {line}")));
            };
            let name = name.trim_end();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Error::InvalidHeader(format!("Bad header name: {line}")));
            }
            headers.add(name, value.trim());
        }

        Ok(headers)
    }
}

/// Canonicalizes a header name (e.g., "content-type" -> "Content-Type").
fn canonical_name(name: &str) -> String {
    if name.eq_ignore_ascii_case("message-id") {
        return "Message-ID".to_string();
    }
    if name.eq_ignore_ascii_case("mime-version") {
        return "MIME-Version".to_string();
    }

    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl fmt::Display for Headers {
    /// Writes wire-format header lines terminated by CRLF.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{}: {}\r\n", canonical_name(name), encode_rfc2047(value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("Subject", "Hi");
        headers.add("to", "bob@example.com");
        assert_eq!(headers.get_all("To").len(), 2);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To"), ["charlie@example.com"]);
        assert_eq!(headers.iter().next(), Some(("To", "charlie@example.com")));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        assert!(headers.contains("subject"));

        headers.remove("SUBJECT");
        assert!(headers.get("Subject").is_none());
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\n",
            "To: recipient@example.com\n",
            "Subject: Test\n",
            "  Message\n",
            "\n",
            "ignored: body"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert!(headers.get("ignored").is_none());
    }

    #[test]
    fn test_headers_parse_rejects_garbage() {
        assert!(Headers::parse("not a header").is_err());
        assert!(Headers::parse(" leading continuation").is_err());
        assert!(Headers::parse("Bad Name: value").is_err());
    }

    #[test]
    fn test_headers_parse_preserves_order() {
        let headers = Headers::parse("X-B: 1\nX-A: 2\n").unwrap();
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["X-B", "X-A"]);
    }

    #[test]
    fn test_headers_display() {
        let mut headers = Headers::new();
        headers.add("from", "sender@example.com");
        headers.add("subject", "Grüße");
        headers.add("message-id", "<1@example.com>");

        let s = headers.to_string();
        assert_eq!(
            s,
            concat!(
                "From: sender@example.com\r\n",
                "Subject: =?utf-8?B?R3LDvMOfZQ==?=\r\n",
                "Message-ID: <1@example.com>\r\n",
            )
        );
    }
}
