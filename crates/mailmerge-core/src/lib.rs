//! # mailmerge-core
//!
//! Merge pipeline for `mailmerge`.
//!
//! This crate provides:
//! - Message templates (header section, blank line, body) with `{{.field}}`
//!   placeholders
//! - Named value overrides layered over input columns
//! - The merge loop driving [`mailmerge_tabular::TabularReader`]
//! - Transports submitting over SMTP or writing `.eml` files and mbox
//!   streams
//! - JSON configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod merge;
pub mod overrides;
pub mod template;
pub mod transport;

pub use config::{MergeConfig, Output};
pub use error::{Error, Result};
pub use merge::{ErrorPolicy, MergeJob, MergeReport};
pub use overrides::{NamedValues, combine, parse_pair};
pub use template::{MessageTemplate, Template};
pub use transport::{DirectoryTransport, MboxTransport, SmtpTransport, Transport};
