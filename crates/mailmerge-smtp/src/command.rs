//! Commands sent during a submission session.

use mailmerge_mime::Address;

/// A client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO with the client's name.
    Ehlo {
        /// Client hostname.
        hostname: String,
    },
    /// STARTTLS
    StartTls,
    /// AUTH PLAIN with the base64 initial response.
    AuthPlain {
        /// Encoded `\0user\0password`.
        response: String,
    },
    /// MAIL FROM
    MailFrom {
        /// Envelope sender.
        from: Address,
        /// SIZE parameter, sent when the server advertises SIZE.
        size: Option<usize>,
    },
    /// RCPT TO
    RcptTo {
        /// Envelope recipient.
        to: Address,
    },
    /// DATA
    Data,
    /// QUIT
    Quit,
}

impl Command {
    /// Serializes the command, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthPlain { response } => format!("AUTH PLAIN {response}"),
            Self::MailFrom { from, size: None } => format!("MAIL FROM:<{from}>"),
            Self::MailFrom {
                from,
                size: Some(size),
            } => format!("MAIL FROM:<{from}> SIZE={size}"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        };
        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns the command name for logging, without arguments.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::AuthPlain { .. } => "AUTH",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Quit => "QUIT",
        }
    }
}

/// Frames a message for the DATA phase.
///
/// Line endings become CRLF, lines starting with `.` get an extra `.`, and
/// the terminating `.` line is appended.
#[must_use]
pub fn frame_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 64);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    if !message.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addr(text: &str) -> Address {
        Address::new(text).unwrap()
    }

    #[test]
    fn test_serialize() {
        let cases = [
            (
                Command::Ehlo {
                    hostname: "localhost".into(),
                },
                "EHLO localhost\r\n",
            ),
            (Command::StartTls, "STARTTLS\r\n"),
            (
                Command::AuthPlain {
                    response: "AHVzZXIAcGFzcw==".into(),
                },
                "AUTH PLAIN AHVzZXIAcGFzcw==\r\n",
            ),
            (
                Command::MailFrom {
                    from: addr("me@example.com"),
                    size: None,
                },
                "MAIL FROM:<me@example.com>\r\n",
            ),
            (
                Command::MailFrom {
                    from: addr("me@example.com"),
                    size: Some(512),
                },
                "MAIL FROM:<me@example.com> SIZE=512\r\n",
            ),
            (
                Command::RcptTo {
                    to: addr("ann@example.com"),
                },
                "RCPT TO:<ann@example.com>\r\n",
            ),
            (Command::Data, "DATA\r\n"),
            (Command::Quit, "QUIT\r\n"),
        ];
        for (command, wire) in cases {
            assert_eq!(command.serialize(), wire.as_bytes());
        }
    }

    #[test]
    fn test_frame_data_stuffs_dots() {
        assert_eq!(
            frame_data(b"Subject: x\r\n\r\n.hidden\r\nok\r\n"),
            b"Subject: x\r\n\r\n..hidden\r\nok\r\n.\r\n"
        );
    }

    #[test]
    fn test_frame_data_normalizes_line_endings() {
        assert_eq!(frame_data(b"a\nb"), b"a\r\nb\r\n.\r\n");
        assert_eq!(frame_data(b"a\r\n\r\n"), b"a\r\n\r\n.\r\n");
        assert_eq!(frame_data(b""), b".\r\n");
    }
}
