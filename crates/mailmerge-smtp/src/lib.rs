//! # mailmerge-smtp
//!
//! SMTP submission (RFC 5321) for merged messages.
//!
//! ## Features
//!
//! - **Type-state client**: EHLO must succeed before any transaction
//! - **TLS**: implicit TLS, or STARTTLS whenever the server offers it
//! - **PLAIN authentication**, refused over plaintext except to the local
//!   machine
//! - **Server addresses** as `host` or `host:port`, port 25 by default
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailmerge_smtp::{Server, Submission};
//!
//! let submission = Submission::new(Server::parse("smtp.example.com:587")?)
//!     .credentials("me@example.com", "secret");
//! submission.send(&from, &[to], b"Subject: Hi\r\n\r\nHello\r\n").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod capability;
pub mod client;
pub mod command;
mod error;
pub mod reply;
pub mod server;
pub mod stream;
pub mod submission;

pub use capability::{Capabilities, Extension};
pub use client::{Client, Greeted, Ready};
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};
pub use server::{DEFAULT_PORT, Server};
pub use stream::SmtpStream;
pub use submission::{Credentials, Security, Submission};
