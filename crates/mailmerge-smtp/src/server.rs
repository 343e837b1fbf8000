//! Submission server addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Port used when the server address has none.
pub const DEFAULT_PORT: u16 = 25;

/// Host and port of a submission server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// Host name or IP address, without brackets.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Server {
    /// Creates a server address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidServer`] if the host is empty or the port is
    /// not a number.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidServer(text.to_string());
        let text = text.trim();

        let (host, port) = if let Some(rest) = text.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match text.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (text, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }

    /// Checks if the host is the local machine.
    ///
    /// Credentials may only cross an unencrypted connection to such a host.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

impl FromStr for Server {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(
            Server::parse("mail.example.com").unwrap(),
            Server::new("mail.example.com", 25)
        );
    }

    #[test]
    fn test_explicit_port() {
        let server: Server = "mail.example.com:587".parse().unwrap();
        assert_eq!(server.port, 587);
        assert_eq!(server.to_string(), "mail.example.com:587");
    }

    #[test]
    fn test_ipv6() {
        assert_eq!(Server::parse("[::1]:2525").unwrap(), Server::new("::1", 2525));
        assert_eq!(Server::parse("[::1]").unwrap().port, DEFAULT_PORT);
        assert_eq!(Server::new("::1", 25).to_string(), "[::1]:25");
    }

    #[test]
    fn test_invalid() {
        for text in ["", ":25", "host:", "host:smtp", "host:70000", "[::1", "[::1]x"] {
            assert!(
                matches!(Server::parse(text), Err(Error::InvalidServer(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_is_local() {
        assert!(Server::parse("localhost:1025").unwrap().is_local());
        assert!(Server::parse("127.0.0.1").unwrap().is_local());
        assert!(Server::parse("[::1]").unwrap().is_local());
        assert!(!Server::parse("mail.example.com").unwrap().is_local());
    }
}
