//! # mailmerge-mime
//!
//! Plain text message composition for mail merge.
//!
//! ## Features
//!
//! - **Headers**: ordered, case-insensitive, parsed from rendered template text
//! - **Addresses**: `user@domain` and `Name <user@domain>` lists
//! - **Encoding**: RFC 2047 header words, Quoted-Printable bodies
//! - **Wire format**: RFC 5322 output with Bcc stripped
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailmerge_mime::{Headers, Message};
//!
//! let headers = Headers::parse("From: me@example.com\nTo: Ann <ann@example.com>\nSubject: Hi\n")?;
//! let message = Message::new(headers, "Hello Ann".to_string());
//!
//! for rcpt in message.envelope_recipients()? {
//!     println!("RCPT TO:<{}>", rcpt.address);
//! }
//! let wire = message.to_bytes()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Address, Mailbox};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, TransferEncoding};
