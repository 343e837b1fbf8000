//! Error types for message composition.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid header line.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid email address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Missing required header.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// Message has no envelope recipients.
    #[error("Message has no recipients")]
    NoRecipients,
}
