//! Error types for SMTP submission.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, including TLS handshake failures.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Server rejected a command.
    #[error("SMTP error {code}: {message}")]
    Rejected {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Server sent something that is not a valid reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server address is not `host` or `host:port`.
    #[error("Invalid SMTP server [{0}], expected host or host:port")]
    InvalidServer(String),

    /// Credentials would be sent in the clear to a remote host.
    #[error("Refusing to authenticate to {0} over an unencrypted connection")]
    InsecureAuth(String),

    /// Feature not advertised by the server.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// Message exceeds the size the server advertised.
    #[error("Message of {size} bytes exceeds server limit of {limit} bytes")]
    MessageTooLarge {
        /// Message size.
        size: usize,
        /// Advertised limit.
        limit: usize,
    },
}

impl Error {
    /// Creates a rejection from a reply code and message.
    #[must_use]
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent rejection (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient rejection (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}
