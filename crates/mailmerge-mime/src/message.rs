//! Outgoing message structure and wire formatting.

use crate::address::Mailbox;
use crate::encoding::{encode_quoted_printable, is_7bit_safe};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset, Local};
use std::fmt;

/// Longest line allowed by RFC 5322, excluding CRLF.
const MAX_7BIT_LINE: usize = 998;

/// Transfer encoding applied to a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII, sent as is.
    SevenBit,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Picks the lightest encoding that can carry `body`.
    #[must_use]
    pub fn for_body(body: &str) -> Self {
        let short_lines = body.lines().all(|line| line.len() <= MAX_7BIT_LINE);
        if is_7bit_safe(body) && short_lines {
            Self::SevenBit
        } else {
            Self::QuotedPrintable
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// A single-part text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message headers, as supplied.
    pub headers: Headers,
    /// Plain text body.
    pub body: String,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub const fn new(headers: Headers, body: String) -> Self {
        Self { headers, body }
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Parses the sender mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if From is missing or invalid.
    pub fn sender(&self) -> Result<Mailbox> {
        let from = self
            .from()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::MissingHeader("From".to_string()))?;
        Mailbox::parse(from)
    }

    /// Parses all mailboxes listed under `name` (all occurrences).
    ///
    /// # Errors
    ///
    /// Returns an error if any listed address is invalid.
    pub fn mailboxes(&self, name: &str) -> Result<Vec<Mailbox>> {
        let mut mailboxes = Vec::new();
        for value in self.headers.get_all(name) {
            mailboxes.extend(Mailbox::parse_list(value)?);
        }
        Ok(mailboxes)
    }

    /// Parses the To recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid.
    pub fn to(&self) -> Result<Vec<Mailbox>> {
        self.mailboxes("to")
    }

    /// Parses the Cc recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid.
    pub fn cc(&self) -> Result<Vec<Mailbox>> {
        self.mailboxes("cc")
    }

    /// Parses the Bcc recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid.
    pub fn bcc(&self) -> Result<Vec<Mailbox>> {
        self.mailboxes("bcc")
    }

    /// Returns every envelope recipient: To, then Cc, then Bcc.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid or there are no recipients.
    pub fn envelope_recipients(&self) -> Result<Vec<Mailbox>> {
        let mut recipients = self.to()?;
        recipients.extend(self.cc()?);
        recipients.extend(self.bcc()?);

        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        Ok(recipients)
    }

    /// Gets the transfer encoding the body will be sent with.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        TransferEncoding::for_body(&self.body)
    }

    /// Renders the RFC 5322 wire form using the current local time for a
    /// missing Date header.
    ///
    /// # Errors
    ///
    /// Returns an error if From is missing or invalid.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.format(Local::now().fixed_offset()).map(String::into_bytes)
    }

    /// Renders the RFC 5322 wire form.
    ///
    /// Bcc is stripped, MIME headers are added where the template left them
    /// out, and `date` fills in a missing Date header.
    ///
    /// # Errors
    ///
    /// Returns an error if From is missing or invalid.
    pub fn format(&self, date: DateTime<FixedOffset>) -> Result<String> {
        self.sender()?;

        let encoding = self.transfer_encoding();
        let mut headers = self.headers.clone();
        headers.remove("bcc");
        if !headers.contains("date") {
            headers.add("Date", date.to_rfc2822());
        }
        if !headers.contains("mime-version") {
            headers.add("MIME-Version", "1.0");
        }
        if !headers.contains("content-type") {
            headers.add("Content-Type", "text/plain; charset=utf-8");
        }
        headers.set("Content-Transfer-Encoding", encoding.to_string());

        let body = match encoding {
            TransferEncoding::SevenBit => self.body.lines().collect::<Vec<_>>().join("\r\n"),
            TransferEncoding::QuotedPrintable => encode_quoted_printable(&self.body),
        };

        let mut out = headers.to_string();
        out.push_str("\r\n");
        out.push_str(&body);
        if !body.is_empty() && !body.ends_with("\r\n") {
            out.push_str("\r\n");
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fixed_date() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Tue, 1 Jul 2025 10:52:37 +0200").unwrap()
    }

    fn message(header_text: &str, body: &str) -> Message {
        Message::new(Headers::parse(header_text).unwrap(), body.to_string())
    }

    #[test]
    fn test_transfer_encoding_choice() {
        assert_eq!(TransferEncoding::for_body("hello\n"), TransferEncoding::SevenBit);
        assert_eq!(
            TransferEncoding::for_body("héllo"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(
            TransferEncoding::for_body(&"x".repeat(1200)),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_envelope_recipients() {
        let msg = message(
            "From: me@example.com\nTo: Ann <ann@example.com>, bob@example.com\nCc: cy@example.com\nBcc: dee@example.com\n",
            "",
        );
        let recipients: Vec<String> = msg
            .envelope_recipients()
            .unwrap()
            .into_iter()
            .map(|m| m.address.to_string())
            .collect();
        assert_eq!(
            recipients,
            [
                "ann@example.com",
                "bob@example.com",
                "cy@example.com",
                "dee@example.com"
            ]
        );
        assert_eq!(msg.to().unwrap().len(), 2);
        assert_eq!(msg.to().unwrap()[0].name.as_deref(), Some("Ann"));
        assert_eq!(msg.cc().unwrap().len(), 1);
        assert_eq!(msg.bcc().unwrap()[0].address.as_str(), "dee@example.com");
    }

    #[test]
    fn test_no_recipients() {
        let msg = message("From: me@example.com\n", "hi");
        assert!(matches!(msg.envelope_recipients(), Err(Error::NoRecipients)));
    }

    #[test]
    fn test_format_requires_from() {
        let msg = message("To: ann@example.com\n", "hi");
        assert!(matches!(
            msg.format(fixed_date()),
            Err(Error::MissingHeader(_))
        ));
    }

    #[test]
    fn test_format_plain() {
        let msg = message(
            "From: me@example.com\nTo: ann@example.com\nBcc: hidden@example.com\nSubject: Hi\n",
            "Hello Ann,\nbye",
        );
        let wire = msg.format(fixed_date()).unwrap();
        assert_eq!(
            wire,
            concat!(
                "From: me@example.com\r\n",
                "To: ann@example.com\r\n",
                "Subject: Hi\r\n",
                "Date: Tue, 1 Jul 2025 10:52:37 +0200\r\n",
                "MIME-Version: 1.0\r\n",
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: 7bit\r\n",
                "\r\n",
                "Hello Ann,\r\n",
                "bye\r\n",
            )
        );
    }

    #[test]
    fn test_format_keeps_template_headers() {
        let msg = message(
            "From: me@example.com\nDate: Mon, 30 Jun 2025 08:00:00 +0000\nContent-Type: text/html; charset=utf-8\n",
            "<p>hi</p>",
        );
        let wire = msg.format(fixed_date()).unwrap();
        assert!(wire.contains("Date: Mon, 30 Jun 2025 08:00:00 +0000\r\n"));
        assert!(!wire.contains("2025 10:52:37"));
        assert!(wire.contains("Content-Type: text/html; charset=utf-8\r\n"));
    }

    #[test]
    fn test_format_quoted_printable() {
        let msg = message("From: me@example.com\nSubject: Grüße\n", "Grüße");
        let wire = msg.format(fixed_date()).unwrap();
        assert!(wire.contains("Subject: =?utf-8?B?R3LDvMOfZQ==?=\r\n"));
        assert!(wire.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        assert!(wire.ends_with("\r\n\r\nGr=C3=BC=C3=9Fe\r\n"));
    }

    #[test]
    fn test_to_bytes_adds_date() {
        let msg = message("From: me@example.com\n", "x");
        let wire = String::from_utf8(msg.to_bytes().unwrap()).unwrap();
        assert!(wire.contains("\r\nDate: "));
    }
}
